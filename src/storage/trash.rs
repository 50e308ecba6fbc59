//! Trash manager: moves an entity and its attributes into the trash tables
//!
//! Inside one transaction:
//! 1. load the live entity (unknown ids fail with `EntityNotFound`)
//! 2. copy it into the entity trash table
//! 3. load its live attributes
//! 4. copy each into the attribute trash table
//! 5. delete the live attributes
//! 6. delete the live entity
//!
//! Any failure rolls the whole move back.

use super::entities::{parse_handle, parse_status};
use super::store::Store;
use crate::attribute::AttributeTrash;
use crate::entity::EntityTrash;
use crate::{Error, Result};
use chrono::Utc;
use rusqlite::{Row, params};

impl Store {
    /// Move an entity and all its attributes to the trash
    pub fn trash(&self, entity_id: &str) -> Result<()> {
        self.trash_by(entity_id, None)
    }

    /// Move an entity to the trash, recording who deleted it
    pub fn trash_by(&self, entity_id: &str, deleted_by: Option<&str>) -> Result<()> {
        if entity_id.is_empty() {
            return Err(Error::InvalidInput("entity id cannot be empty".to_string()));
        }

        self.with_transaction(|conn| {
            let entity = self
                .entity_by_id(conn, entity_id)?
                .ok_or_else(|| Error::EntityNotFound(entity_id.to_string()))?;

            let deleted_at = Utc::now();
            let trashed = EntityTrash::from_entity(&entity, deleted_at, deleted_by);
            self.execute(
                conn,
                &self.sql.insert_entity_trash,
                params![
                    trashed.id,
                    trashed.status.as_str(),
                    trashed.entity_type,
                    trashed.handle.as_deref().unwrap_or(""),
                    trashed.created_at,
                    trashed.updated_at,
                    trashed.deleted_at,
                    trashed.deleted_by,
                ],
            )?;

            let attrs = self.attributes_of(conn, entity_id)?;
            for attr in &attrs {
                let trashed = AttributeTrash::from_attribute(attr, deleted_at, deleted_by);
                self.execute(
                    conn,
                    &self.sql.insert_attribute_trash,
                    params![
                        trashed.id,
                        trashed.entity_id,
                        trashed.key,
                        trashed.value,
                        trashed.created_at,
                        trashed.updated_at,
                        trashed.deleted_at,
                        trashed.deleted_by,
                    ],
                )?;
            }

            self.execute(conn, &self.sql.delete_attributes, [entity_id])?;
            self.execute(conn, &self.sql.delete_entity, [entity_id])?;

            tracing::debug!(entity_id, attributes = attrs.len(), "entity moved to trash");
            Ok(())
        })
    }

    /// Trash rows for an entity id, oldest deletion first
    pub fn entity_trash_list(&self, entity_id: &str) -> Result<Vec<EntityTrash>> {
        self.with_connection(|conn| {
            self.query_all(conn, &self.sql.list_entity_trash, [entity_id], row_to_entity_trash)
        })
    }

    /// Trashed attribute rows for an entity id
    pub fn attribute_trash_list(&self, entity_id: &str) -> Result<Vec<AttributeTrash>> {
        self.with_connection(|conn| {
            self.query_all(conn, &self.sql.list_attribute_trash, [entity_id], row_to_attribute_trash)
        })
    }
}

fn row_to_entity_trash(row: &Row<'_>) -> rusqlite::Result<EntityTrash> {
    Ok(EntityTrash {
        id: row.get(0)?,
        status: parse_status(row, 1)?,
        entity_type: row.get(2)?,
        handle: parse_handle(row, 3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
        deleted_at: row.get(6)?,
        deleted_by: row.get(7)?,
    })
}

fn row_to_attribute_trash(row: &Row<'_>) -> rusqlite::Result<AttributeTrash> {
    let value: Option<String> = row.get(3)?;
    Ok(AttributeTrash {
        id: row.get(0)?,
        entity_id: row.get(1)?,
        key: row.get(2)?,
        value: value.unwrap_or_default(),
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
        deleted_at: row.get(6)?,
        deleted_by: row.get(7)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn store() -> Store {
        Store::builder(Connection::open_in_memory().unwrap())
            .entity_table("cms_entity")
            .attribute_table("cms_attribute")
            .auto_migrate(true)
            .build()
            .unwrap()
    }

    #[test]
    fn test_trash_moves_everything() {
        let store = store();
        let entity = store
            .create_with_attributes("post", [("name", "Hello"), ("body", "World")])
            .unwrap();

        store.trash_by(&entity.id, Some("admin")).unwrap();

        assert!(store.find_by_id(&entity.id).unwrap().is_none());
        assert!(store.attribute_list(&entity.id).unwrap().is_empty());
        assert_eq!(store.count("post").unwrap(), 0);

        let trashed = store.entity_trash_list(&entity.id).unwrap();
        assert_eq!(trashed.len(), 1);
        assert_eq!(trashed[0].entity_type, "post");
        assert_eq!(trashed[0].deleted_by.as_deref(), Some("admin"));
        assert!(trashed[0].deleted_at >= entity.updated_at);

        let attrs = store.attribute_trash_list(&entity.id).unwrap();
        assert_eq!(attrs.len(), 2);
        assert!(attrs.iter().all(|a| a.deleted_at >= a.updated_at));
    }

    #[test]
    fn test_trash_unknown_entity_fails() {
        let store = store();
        let err = store.trash("nope").unwrap_err();
        assert!(matches!(err, Error::EntityNotFound(id) if id == "nope"));
        assert!(store.entity_trash_list("nope").unwrap().is_empty());
        assert!(matches!(store.trash(""), Err(Error::InvalidInput(_))));
    }
}
