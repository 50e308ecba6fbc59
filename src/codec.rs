//! Attribute value codec
//!
//! Attribute values live in a single text column. Strings are stored as-is,
//! numbers in their shortest round-tripping decimal form, and structured
//! values as JSON.

use crate::{Error, Result};
use serde::Serialize;
use std::fmt;

/// Kind of a typed attribute value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    String,
    Int,
    Float,
    Json,
}

/// A typed attribute value before encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    String(String),
    Int(i64),
    Float(f64),
    Json(serde_json::Value),
}

impl AttributeValue {
    /// Wrap any serializable value as structured JSON
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(AttributeValue::Json(serde_json::to_value(value)?))
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            AttributeValue::String(_) => ValueKind::String,
            AttributeValue::Int(_) => ValueKind::Int,
            AttributeValue::Float(_) => ValueKind::Float,
            AttributeValue::Json(_) => ValueKind::Json,
        }
    }

    /// Encode into the textual storage form
    pub fn encode(&self) -> String {
        match self {
            AttributeValue::String(s) => s.clone(),
            AttributeValue::Int(i) => i.to_string(),
            // Display for f64 is the shortest form that parses back exactly
            AttributeValue::Float(f) => f.to_string(),
            AttributeValue::Json(v) => v.to_string(),
        }
    }

    /// Decode stored text as a value of the given kind
    pub fn decode(kind: ValueKind, text: &str) -> Result<Self> {
        match kind {
            ValueKind::String => Ok(AttributeValue::String(text.to_string())),
            ValueKind::Int => text
                .trim()
                .parse()
                .map(AttributeValue::Int)
                .map_err(|e| Error::Codec(format!("invalid integer {:?}: {}", text, e))),
            ValueKind::Float => text
                .trim()
                .parse()
                .map(AttributeValue::Float)
                .map_err(|e| Error::Codec(format!("invalid float {:?}: {}", text, e))),
            ValueKind::Json => Ok(AttributeValue::Json(serde_json::from_str(text)?)),
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::String(value)
    }
}

impl From<&String> for AttributeValue {
    fn from(value: &String) -> Self {
        AttributeValue::String(value.clone())
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Int(value)
    }
}

impl From<i32> for AttributeValue {
    fn from(value: i32) -> Self {
        AttributeValue::Int(value.into())
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Float(value)
    }
}

impl From<serde_json::Value> for AttributeValue {
    fn from(value: serde_json::Value) -> Self {
        AttributeValue::Json(value)
    }
}
