//! Attribute repository: per-entity key/value rows with upsert semantics
//!
//! There is no uniqueness constraint on `(entity_id, attribute_key)`; the
//! repository keeps one live row per pair by looking the key up before every
//! write, inside the same transaction as the write.

use super::store::Store;
use crate::attribute::Attribute;
use crate::codec::AttributeValue;
use crate::Result;
use rusqlite::{Connection, Row, params};
use serde::Serialize;
use serde::de::DeserializeOwned;

impl Store {
    // ========== Attribute Operations ==========

    /// Insert a new attribute row without looking for an existing one
    pub fn attribute_create(
        &self,
        entity_id: &str,
        key: &str,
        value: impl Into<AttributeValue>,
    ) -> Result<Attribute> {
        let attr = Attribute::new(self.next_id(), entity_id, key, &value.into());
        self.with_connection(|conn| self.insert_attribute(conn, &attr))?;
        Ok(attr)
    }

    /// Find the live attribute `key` of an entity
    pub fn attribute_find(&self, entity_id: &str, key: &str) -> Result<Option<Attribute>> {
        self.with_connection(|conn| self.attribute_by_key(conn, entity_id, key))
    }

    /// All live attributes of an entity, ordered by key
    pub fn attribute_list(&self, entity_id: &str) -> Result<Vec<Attribute>> {
        self.with_connection(|conn| self.attributes_of(conn, entity_id))
    }

    /// Insert or update attribute `key` of an entity.
    ///
    /// An existing row keeps its id and `created_at`; only the value and
    /// `updated_at` change.
    pub fn set_attribute(
        &self,
        entity_id: &str,
        key: &str,
        value: impl Into<AttributeValue>,
    ) -> Result<Attribute> {
        let value = value.into();
        self.with_transaction(|conn| self.upsert_attribute(conn, entity_id, key, &value))
    }

    pub fn set_string(&self, entity_id: &str, key: &str, value: &str) -> Result<Attribute> {
        self.set_attribute(entity_id, key, AttributeValue::from(value))
    }

    pub fn set_int(&self, entity_id: &str, key: &str, value: i64) -> Result<Attribute> {
        self.set_attribute(entity_id, key, AttributeValue::Int(value))
    }

    pub fn set_float(&self, entity_id: &str, key: &str, value: f64) -> Result<Attribute> {
        self.set_attribute(entity_id, key, AttributeValue::Float(value))
    }

    /// Store any serializable value as JSON
    pub fn set_json<T: Serialize + ?Sized>(&self, entity_id: &str, key: &str, value: &T) -> Result<Attribute> {
        self.set_attribute(entity_id, key, AttributeValue::json(value)?)
    }

    /// Upsert several attributes in one transaction; all or nothing
    pub fn attributes_set<I, K, V>(&self, entity_id: &str, attributes: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<AttributeValue>,
    {
        let attributes: Vec<(String, AttributeValue)> = attributes
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        self.with_transaction(|conn| {
            for (key, value) in &attributes {
                self.upsert_attribute(conn, entity_id, key, value)?;
            }
            Ok(())
        })
    }

    // ========== Typed Reads ==========

    pub fn get_string(&self, entity_id: &str, key: &str) -> Result<Option<String>> {
        Ok(self.attribute_find(entity_id, key)?.map(|attr| attr.value))
    }

    pub fn get_int(&self, entity_id: &str, key: &str) -> Result<Option<i64>> {
        self.attribute_find(entity_id, key)?
            .map(|attr| attr.as_int())
            .transpose()
    }

    pub fn get_float(&self, entity_id: &str, key: &str) -> Result<Option<f64>> {
        self.attribute_find(entity_id, key)?
            .map(|attr| attr.as_float())
            .transpose()
    }

    pub fn get_json<T: DeserializeOwned>(&self, entity_id: &str, key: &str) -> Result<Option<T>> {
        self.attribute_find(entity_id, key)?
            .map(|attr| attr.as_json())
            .transpose()
    }

    // ========== Row Helpers ==========

    pub(crate) fn insert_attribute(&self, conn: &Connection, attr: &Attribute) -> Result<()> {
        self.execute(
            conn,
            &self.sql.insert_attribute,
            params![
                attr.id,
                attr.entity_id,
                attr.key,
                attr.value,
                attr.created_at,
                attr.updated_at,
            ],
        )?;
        Ok(())
    }

    fn update_attribute(&self, conn: &Connection, attr: &Attribute) -> Result<()> {
        self.execute(
            conn,
            &self.sql.update_attribute,
            params![
                attr.entity_id,
                attr.key,
                attr.value,
                attr.created_at,
                attr.updated_at,
                attr.id,
            ],
        )?;
        Ok(())
    }

    fn upsert_attribute(
        &self,
        conn: &Connection,
        entity_id: &str,
        key: &str,
        value: &AttributeValue,
    ) -> Result<Attribute> {
        match self.attribute_by_key(conn, entity_id, key)? {
            None => {
                let attr = Attribute::new(self.next_id(), entity_id, key, value);
                self.insert_attribute(conn, &attr)?;
                Ok(attr)
            }
            Some(mut attr) => {
                attr.set_value(value);
                self.update_attribute(conn, &attr)?;
                Ok(attr)
            }
        }
    }

    fn attribute_by_key(&self, conn: &Connection, entity_id: &str, key: &str) -> Result<Option<Attribute>> {
        self.query_opt(conn, &self.sql.select_attribute, [entity_id, key], row_to_attribute)
    }

    pub(crate) fn attributes_of(&self, conn: &Connection, entity_id: &str) -> Result<Vec<Attribute>> {
        self.query_all(conn, &self.sql.list_attributes, [entity_id], row_to_attribute)
    }
}

/// Helper to convert a row to an Attribute
fn row_to_attribute(row: &Row<'_>) -> rusqlite::Result<Attribute> {
    let value: Option<String> = row.get(3)?;
    Ok(Attribute {
        id: row.get(0)?,
        entity_id: row.get(1)?,
        key: row.get(2)?,
        value: value.unwrap_or_default(),
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}
