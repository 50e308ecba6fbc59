//! Attribute types
//!
//! One row per `(entity_id, attribute_key)`, value kept as encoded text.

use crate::codec::{AttributeValue, ValueKind};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A live attribute row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub id: String,
    pub entity_id: String,
    pub key: String,
    /// Encoded value, see [`crate::codec`]
    pub value: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Attribute {
    pub fn new(
        id: impl Into<String>,
        entity_id: impl Into<String>,
        key: impl Into<String>,
        value: &AttributeValue,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            entity_id: entity_id.into(),
            key: key.into(),
            value: value.encode(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the value and bump `updated_at`
    pub fn set_value(&mut self, value: &AttributeValue) {
        self.value = value.encode();
        self.updated_at = Utc::now();
    }

    /// Decode the stored text as the given kind
    pub fn decode(&self, kind: ValueKind) -> Result<AttributeValue> {
        AttributeValue::decode(kind, &self.value)
    }

    pub fn as_string(&self) -> &str {
        &self.value
    }

    pub fn as_int(&self) -> Result<i64> {
        match self.decode(ValueKind::Int)? {
            AttributeValue::Int(i) => Ok(i),
            other => Err(Error::Codec(format!("expected int, decoded {:?}", other.kind()))),
        }
    }

    pub fn as_float(&self) -> Result<f64> {
        match self.decode(ValueKind::Float)? {
            AttributeValue::Float(f) => Ok(f),
            other => Err(Error::Codec(format!("expected float, decoded {:?}", other.kind()))),
        }
    }

    /// Deserialize a structured (JSON) value
    pub fn as_json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.value)?)
    }
}

/// Soft-deleted copy of an attribute, kept in the attribute trash table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeTrash {
    pub id: String,
    pub entity_id: String,
    pub key: String,
    pub value: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: DateTime<Utc>,
    pub deleted_by: Option<String>,
}

impl AttributeTrash {
    pub fn from_attribute(attr: &Attribute, deleted_at: DateTime<Utc>, deleted_by: Option<&str>) -> Self {
        Self {
            id: attr.id.clone(),
            entity_id: attr.entity_id.clone(),
            key: attr.key.clone(),
            value: attr.value.clone(),
            created_at: attr.created_at,
            updated_at: attr.updated_at,
            deleted_at,
            deleted_by: deleted_by.map(str::to_string),
        }
    }
}
