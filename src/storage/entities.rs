//! Entity repository: create, lookup, listing and update of entity rows

use super::store::Store;
use crate::attribute::Attribute;
use crate::codec::AttributeValue;
use crate::entity::{Entity, EntityQuery, EntityStatus};
use crate::storage::statements::{ID_BATCH, like_contains};
use crate::{Error, Result};
use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{Connection, Row, params, params_from_iter};
use std::collections::BTreeMap;

impl Store {
    // ========== Entity Operations ==========

    /// Create an entity of the given type with a fresh id and timestamps.
    ///
    /// On failure the attempted entity travels inside
    /// [`Error::EntityInsert`].
    pub fn create(&self, entity_type: &str) -> Result<Entity> {
        let entity = Entity::new(self.next_id(), entity_type);

        match self.with_connection(|conn| self.insert_entity(conn, &entity)) {
            Ok(()) => Ok(entity),
            Err(Error::Storage(source)) => Err(Error::EntityInsert {
                entity: Box::new(entity),
                source,
            }),
            Err(e) => Err(e),
        }
    }

    /// Create an entity together with its attributes in one transaction.
    ///
    /// Either the entity and every attribute are written, or nothing is.
    /// Duplicate keys collapse to the last value given.
    pub fn create_with_attributes<I, K, V>(&self, entity_type: &str, attributes: I) -> Result<Entity>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<AttributeValue>,
    {
        let attributes: BTreeMap<String, AttributeValue> = attributes
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        self.with_transaction(|conn| {
            let entity = Entity::new(self.next_id(), entity_type);
            self.insert_entity(conn, &entity)?;

            for (key, value) in &attributes {
                let attr = Attribute::new(self.next_id(), &entity.id, key, value);
                self.insert_attribute(conn, &attr)?;
            }

            Ok(entity)
        })
    }

    /// Find an entity by id. `Ok(None)` when it does not exist.
    pub fn find_by_id(&self, entity_id: &str) -> Result<Option<Entity>> {
        if entity_id.is_empty() {
            return Err(Error::InvalidInput("entity id cannot be empty".to_string()));
        }
        self.with_connection(|conn| self.entity_by_id(conn, entity_id))
    }

    /// Find an entity by its handle within a type
    pub fn find_by_handle(&self, entity_type: &str, handle: &str) -> Result<Option<Entity>> {
        if entity_type.is_empty() || handle.is_empty() {
            return Ok(None);
        }
        self.with_connection(|conn| {
            self.query_opt(
                conn,
                &self.sql.select_entity_by_handle,
                params![entity_type, handle],
                row_to_entity,
            )
        })
    }

    /// Find the entity of `entity_type` carrying `key = value`.
    ///
    /// When several entities match, the one with the lowest id wins.
    pub fn find_by_attribute(
        &self,
        entity_type: &str,
        key: &str,
        value: impl Into<AttributeValue>,
    ) -> Result<Option<Entity>> {
        let value = value.into().encode();
        self.with_connection(|conn| {
            let entity_id: Option<String> = self.query_opt(
                conn,
                &self.sql.find_entity_id_by_attribute,
                params![entity_type, key, value],
                |row| row.get(0),
            )?;

            match entity_id {
                Some(id) => self.entity_by_id(conn, &id),
                None => Ok(None),
            }
        })
    }

    /// List entities of a type; see [`EntityQuery`] for paging, search and ordering
    pub fn list(&self, query: &EntityQuery) -> Result<Vec<Entity>> {
        let sql = self.sql.list_entities(query);

        let mut binds = vec![query.entity_type.clone()];
        if let Some(search) = &query.search {
            binds.push(like_contains(search));
            binds.push(search.clone());
        }

        self.with_connection(|conn| self.query_all(conn, &sql, params_from_iter(binds), row_to_entity))
    }

    /// All entities of `entity_type` carrying `key = value`, ordered by id
    pub fn list_by_attribute(
        &self,
        entity_type: &str,
        key: &str,
        value: impl Into<AttributeValue>,
    ) -> Result<Vec<Entity>> {
        let value = value.into().encode();
        self.with_connection(|conn| {
            let ids: Vec<String> = self.query_all(
                conn,
                &self.sql.list_entity_ids_by_attribute,
                params![entity_type, key, value],
                |row| row.get(0),
            )?;

            if ids.is_empty() {
                return Ok(Vec::new());
            }

            self.entities_by_ids(conn, &ids, ID_BATCH)
        })
    }

    /// Count entities of a type
    pub fn count(&self, entity_type: &str) -> Result<u64> {
        let count: Option<i64> = self.with_connection(|conn| {
            self.query_opt(conn, &self.sql.count_entities, [entity_type], |row| row.get(0))
        })?;
        Ok(count.unwrap_or(0) as u64)
    }

    /// Write every column of `entity` back and stamp `updated_at`.
    ///
    /// Returns `false` when no row has the entity's id.
    pub fn update(&self, entity: &mut Entity) -> Result<bool> {
        entity.updated_at = Utc::now();
        let changed = self.with_connection(|conn| {
            self.execute(
                conn,
                &self.sql.update_entity,
                params![
                    entity.status.as_str(),
                    entity.entity_type,
                    entity.handle.as_deref().unwrap_or(""),
                    entity.created_at,
                    entity.updated_at,
                    entity.id,
                ],
            )
        })?;
        Ok(changed > 0)
    }

    /// Permanently delete an entity and its attributes, bypassing the trash.
    ///
    /// Returns `false` when the entity did not exist.
    pub fn delete(&self, entity_id: &str) -> Result<bool> {
        if entity_id.is_empty() {
            return Err(Error::InvalidInput("entity id cannot be empty".to_string()));
        }
        self.with_transaction(|conn| {
            self.execute(conn, &self.sql.delete_attributes, [entity_id])?;
            let deleted = self.execute(conn, &self.sql.delete_entity, [entity_id])?;
            Ok(deleted > 0)
        })
    }

    // ========== Row Helpers ==========

    /// Load entities for ids already sorted ascending, `batch` ids per
    /// statement. Each batch comes back id-ordered, so the concatenation is too.
    pub(crate) fn entities_by_ids(&self, conn: &Connection, ids: &[String], batch: usize) -> Result<Vec<Entity>> {
        let mut entities = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(batch.max(1)) {
            let sql = self.sql.select_entities_by_ids(chunk.len());
            entities.extend(self.query_all(conn, &sql, params_from_iter(chunk), row_to_entity)?);
        }
        Ok(entities)
    }

    pub(crate) fn insert_entity(&self, conn: &Connection, entity: &Entity) -> Result<()> {
        self.execute(
            conn,
            &self.sql.insert_entity,
            params![
                entity.id,
                entity.status.as_str(),
                entity.entity_type,
                entity.handle.as_deref().unwrap_or(""),
                entity.created_at,
                entity.updated_at,
            ],
        )?;
        Ok(())
    }

    pub(crate) fn entity_by_id(&self, conn: &Connection, entity_id: &str) -> Result<Option<Entity>> {
        self.query_opt(conn, &self.sql.select_entity_by_id, [entity_id], row_to_entity)
    }
}

pub(crate) fn parse_status(row: &Row<'_>, idx: usize) -> rusqlite::Result<EntityStatus> {
    let status: String = row.get(idx)?;
    status.parse().map_err(|e: Error| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
    })
}

/// Empty handles are stored as `''`
pub(crate) fn parse_handle(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<String>> {
    let handle: Option<String> = row.get(idx)?;
    Ok(handle.filter(|h| !h.is_empty()))
}

/// Helper to convert a row to an Entity
pub(crate) fn row_to_entity(row: &Row<'_>) -> rusqlite::Result<Entity> {
    Ok(Entity {
        id: row.get(0)?,
        status: parse_status(row, 1)?,
        entity_type: row.get(2)?,
        handle: parse_handle(row, 3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{OrderBy, SortOrder};

    fn store() -> Store {
        Store::builder(Connection::open_in_memory().unwrap())
            .entity_table("cms_entity")
            .attribute_table("cms_attribute")
            .auto_migrate(true)
            .build()
            .unwrap()
    }

    #[test]
    fn test_entity_crud() {
        let store = store();

        let entity = store.create("post").unwrap();
        assert_eq!(store.count("post").unwrap(), 1);

        let mut found = store.find_by_id(&entity.id).unwrap().unwrap();
        assert_eq!(found, entity);

        found.handle = Some("hello-world".to_string());
        found.status = EntityStatus::Inactive;
        assert!(store.update(&mut found).unwrap());
        assert!(found.updated_at >= entity.updated_at);

        let by_handle = store.find_by_handle("post", "hello-world").unwrap().unwrap();
        assert_eq!(by_handle.id, entity.id);
        assert_eq!(by_handle.status, EntityStatus::Inactive);
        assert_eq!(by_handle.created_at, entity.created_at);
    }

    #[test]
    fn test_absent_is_none_not_error() {
        let store = store();
        assert!(store.find_by_id("missing").unwrap().is_none());
        assert!(store.find_by_handle("post", "missing").unwrap().is_none());
        assert!(store.find_by_handle("post", "").unwrap().is_none());
        assert!(store.find_by_attribute("post", "name", "missing").unwrap().is_none());
        assert!(store.list_by_attribute("post", "name", "missing").unwrap().is_empty());
        assert_eq!(store.count("page").unwrap(), 0);
        assert!(matches!(store.find_by_id(""), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_update_unknown_id_reports_false() {
        let store = store();
        let mut ghost = Entity::new("ghost", "post");
        assert!(!store.update(&mut ghost).unwrap());
        assert!(store.find_by_id("ghost").unwrap().is_none());
    }

    #[test]
    fn test_create_failure_carries_entity() {
        let store = Store::builder(Connection::open_in_memory().unwrap())
            .entity_table("cms_entity")
            .attribute_table("cms_attribute")
            .build()
            .unwrap();

        match store.create("post") {
            Err(Error::EntityInsert { entity, .. }) => {
                assert_eq!(entity.entity_type, "post");
                assert!(!entity.id.is_empty());
            }
            other => panic!("expected EntityInsert, got {:?}", other),
        }
    }

    #[test]
    fn test_find_by_attribute_picks_lowest_id() {
        let store = store();
        let a = store.create_with_attributes("post", [("slug", "same")]).unwrap();
        let b = store.create_with_attributes("post", [("slug", "same")]).unwrap();
        store.create_with_attributes("page", [("slug", "same")]).unwrap();

        let lowest = if a.id < b.id { &a } else { &b };
        let found = store.find_by_attribute("post", "slug", "same").unwrap().unwrap();
        assert_eq!(&found.id, &lowest.id);

        let all = store.list_by_attribute("post", "slug", "same").unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].id < all[1].id);
    }

    #[test]
    fn test_entities_by_ids_in_batches() {
        let store = store();
        for _ in 0..7 {
            store.create_with_attributes("post", [("flag", "on")]).unwrap();
        }
        let expected = store.list_by_attribute("post", "flag", "on").unwrap();
        let mut ids: Vec<String> = expected.iter().map(|e| e.id.clone()).collect();
        ids.sort();

        for batch in [1, 2, 3, 7, 100] {
            let loaded = store
                .with_connection(|conn| store.entities_by_ids(conn, &ids, batch))
                .unwrap();
            assert_eq!(loaded, expected);
        }
        let none = store.with_connection(|conn| store.entities_by_ids(conn, &[], 2)).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_find_by_typed_attribute() {
        let store = store();
        let entity = store.create_with_attributes("product", [("stock", 12i64)]).unwrap();
        let found = store.find_by_attribute("product", "stock", 12i64).unwrap().unwrap();
        assert_eq!(found.id, entity.id);
    }

    #[test]
    fn test_list_search_and_order() {
        let store = store();
        for handle in ["apple", "banana", "cherry_pie"] {
            let mut e = store.create("fruit").unwrap();
            e.handle = Some(handle.to_string());
            store.update(&mut e).unwrap();
        }

        let found = store.list(&EntityQuery::new("fruit").search("an")).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].handle.as_deref(), Some("banana"));

        // SQLite LIKE ignores ASCII case
        let found = store.list(&EntityQuery::new("fruit").search("BAN")).unwrap();
        assert_eq!(found.len(), 1);

        // '_' is matched literally, not as a wildcard
        let found = store.list(&EntityQuery::new("fruit").search("y_p")).unwrap();
        assert_eq!(found.len(), 1);
        assert!(store.list(&EntityQuery::new("fruit").search("r_y")).unwrap().is_empty());

        let by_id = store.list(&EntityQuery::new("fruit").search(found[0].id.clone())).unwrap();
        assert_eq!(by_id.len(), 1);

        let desc = store
            .list(&EntityQuery::new("fruit").order_by(OrderBy::Handle, SortOrder::Desc))
            .unwrap();
        let handles: Vec<_> = desc.iter().filter_map(|e| e.handle.as_deref()).collect();
        assert_eq!(handles, vec!["cherry_pie", "banana", "apple"]);
    }

    #[test]
    fn test_hard_delete() {
        let store = store();
        let entity = store.create_with_attributes("post", [("name", "bye")]).unwrap();
        assert!(store.delete(&entity.id).unwrap());
        assert!(!store.delete(&entity.id).unwrap());
        assert!(store.find_by_id(&entity.id).unwrap().is_none());
        assert!(store.attribute_list(&entity.id).unwrap().is_empty());
        assert!(store.entity_trash_list(&entity.id).unwrap().is_empty());
    }
}
