//! Dialect-aware statement rendering
//!
//! Fixed statements are rendered once when the store is built; statements
//! whose shape depends on arguments (listing, IN-lists) are rendered per call.
//! Parameters are always numbered in the order they are bound.

use super::schema::TableNames;
use crate::dialect::Dialect;
use crate::entity::{EntityQuery, OrderBy};

pub(crate) const ENTITY_COLUMNS: &[&str] = &[
    "id",
    "entity_status",
    "entity_type",
    "entity_handle",
    "created_at",
    "updated_at",
];

pub(crate) const ATTRIBUTE_COLUMNS: &[&str] = &[
    "id",
    "entity_id",
    "attribute_key",
    "attribute_value",
    "created_at",
    "updated_at",
];

const TRASH_COLUMNS: &[&str] = &["deleted_at", "deleted_by"];

/// Ids bound per IN-list; stays well under every supported backend's
/// parameter limit (SQLite allows 32766).
pub(crate) const ID_BATCH: usize = 500;

/// Escape character used in LIKE patterns
pub(crate) const LIKE_ESCAPE: char = '!';

/// Escape LIKE wildcards so `search` matches literally
pub(crate) fn like_contains(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[derive(Debug, Clone)]
pub(crate) struct Statements {
    dialect: Dialect,
    entity_table: String,
    entity_columns: String,

    pub insert_entity: String,
    pub select_entity_by_id: String,
    pub select_entity_by_handle: String,
    pub update_entity: String,
    pub delete_entity: String,
    pub count_entities: String,
    pub find_entity_id_by_attribute: String,
    pub list_entity_ids_by_attribute: String,

    pub insert_attribute: String,
    pub select_attribute: String,
    pub update_attribute: String,
    pub list_attributes: String,
    pub delete_attributes: String,

    pub insert_entity_trash: String,
    pub insert_attribute_trash: String,
    pub list_entity_trash: String,
    pub list_attribute_trash: String,
}

impl Statements {
    pub fn new(dialect: Dialect, tables: &TableNames) -> Self {
        let q = |ident: &str| dialect.quote(ident);
        let p = |n: usize| dialect.placeholder(n);
        let columns = |cols: &[&str]| cols.iter().map(|&c| q(c)).collect::<Vec<_>>().join(", ");
        let assignments = |cols: &[&str]| {
            cols.iter()
                .enumerate()
                .map(|(i, &c)| format!("{} = {}", q(c), p(i + 1)))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let insert = |table: &str, cols: &[&str]| {
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                q(table),
                columns(cols),
                dialect.placeholders(1, cols.len())
            )
        };

        let entity = q(&tables.entity);
        let attribute = q(&tables.attribute);
        let entity_columns = columns(ENTITY_COLUMNS);
        let attribute_columns = columns(ATTRIBUTE_COLUMNS);
        let trash_entity_columns = [ENTITY_COLUMNS, TRASH_COLUMNS].concat();
        let trash_attribute_columns = [ATTRIBUTE_COLUMNS, TRASH_COLUMNS].concat();

        let attribute_join = format!(
            "FROM {attribute} a INNER JOIN {entity} e ON a.{} = e.{} \
             WHERE e.{} = {} AND a.{} = {} AND a.{} = {}",
            q("entity_id"),
            q("id"),
            q("entity_type"),
            p(1),
            q("attribute_key"),
            p(2),
            q("attribute_value"),
            p(3),
        );

        Self {
            insert_entity: insert(&tables.entity, ENTITY_COLUMNS),
            select_entity_by_id: format!(
                "SELECT {entity_columns} FROM {entity} WHERE {} = {}",
                q("id"),
                p(1)
            ),
            select_entity_by_handle: format!(
                "SELECT {entity_columns} FROM {entity} WHERE {} = {} AND {} = {} ORDER BY {} ASC{}",
                q("entity_type"),
                p(1),
                q("entity_handle"),
                p(2),
                q("id"),
                dialect.limit_offset(Some(1), 0)
            ),
            update_entity: format!(
                "UPDATE {entity} SET {} WHERE {} = {}",
                assignments(&ENTITY_COLUMNS[1..]),
                q("id"),
                p(ENTITY_COLUMNS.len())
            ),
            delete_entity: format!("DELETE FROM {entity} WHERE {} = {}", q("id"), p(1)),
            count_entities: format!(
                "SELECT COUNT(*) FROM {entity} WHERE {} = {}",
                q("entity_type"),
                p(1)
            ),
            find_entity_id_by_attribute: format!(
                "SELECT a.{} {attribute_join} ORDER BY a.{} ASC{}",
                q("entity_id"),
                q("entity_id"),
                dialect.limit_offset(Some(1), 0)
            ),
            list_entity_ids_by_attribute: format!(
                "SELECT DISTINCT a.{} {attribute_join} ORDER BY a.{} ASC",
                q("entity_id"),
                q("entity_id")
            ),

            insert_attribute: insert(&tables.attribute, ATTRIBUTE_COLUMNS),
            select_attribute: format!(
                "SELECT {attribute_columns} FROM {attribute} WHERE {} = {} AND {} = {} ORDER BY {} ASC{}",
                q("entity_id"),
                p(1),
                q("attribute_key"),
                p(2),
                q("id"),
                dialect.limit_offset(Some(1), 0)
            ),
            update_attribute: format!(
                "UPDATE {attribute} SET {} WHERE {} = {}",
                assignments(&ATTRIBUTE_COLUMNS[1..]),
                q("id"),
                p(ATTRIBUTE_COLUMNS.len())
            ),
            list_attributes: format!(
                "SELECT {attribute_columns} FROM {attribute} WHERE {} = {} ORDER BY {} ASC",
                q("entity_id"),
                p(1),
                q("attribute_key")
            ),
            delete_attributes: format!(
                "DELETE FROM {attribute} WHERE {} = {}",
                q("entity_id"),
                p(1)
            ),

            insert_entity_trash: insert(&tables.entity_trash, trash_entity_columns.as_slice()),
            insert_attribute_trash: insert(&tables.attribute_trash, trash_attribute_columns.as_slice()),
            list_entity_trash: format!(
                "SELECT {} FROM {} WHERE {} = {} ORDER BY {} ASC",
                columns(trash_entity_columns.as_slice()),
                q(&tables.entity_trash),
                q("id"),
                p(1),
                q("deleted_at")
            ),
            list_attribute_trash: format!(
                "SELECT {} FROM {} WHERE {} = {} ORDER BY {} ASC, {} ASC",
                columns(trash_attribute_columns.as_slice()),
                q(&tables.attribute_trash),
                q("entity_id"),
                p(1),
                q("deleted_at"),
                q("attribute_key")
            ),

            dialect,
            entity_table: entity,
            entity_columns,
        }
    }

    /// Entities whose id is one of `count` bound ids, ordered by id
    pub fn select_entities_by_ids(&self, count: usize) -> String {
        format!(
            "SELECT {} FROM {} WHERE {} IN ({}) ORDER BY {} ASC",
            self.entity_columns,
            self.entity_table,
            self.dialect.quote("id"),
            self.dialect.placeholders(1, count),
            self.dialect.quote("id")
        )
    }

    /// Listing statement. Binds the type, then (with a search) the LIKE
    /// pattern and the exact id.
    pub fn list_entities(&self, query: &EntityQuery) -> String {
        let q = |ident: &str| self.dialect.quote(ident);

        let mut sql = format!(
            "SELECT {} FROM {} WHERE {} = {}",
            self.entity_columns,
            self.entity_table,
            q("entity_type"),
            self.dialect.placeholder(1)
        );

        if query.search.is_some() {
            sql.push_str(&format!(
                " AND ({} LIKE {} ESCAPE '{}' OR {} = {})",
                q("entity_handle"),
                self.dialect.placeholder(2),
                LIKE_ESCAPE,
                q("id"),
                self.dialect.placeholder(3)
            ));
        }

        sql.push_str(&format!(
            " ORDER BY {} {}",
            q(query.order_by.column()),
            query.sort.as_sql()
        ));
        if query.order_by != OrderBy::Id {
            sql.push_str(&format!(", {} ASC", q("id")));
        }

        let limit = query.limit.filter(|&n| n > 0);
        sql.push_str(&self.dialect.limit_offset(limit, query.offset));
        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::SortOrder;

    fn statements(dialect: Dialect) -> Statements {
        Statements::new(dialect, &TableNames::new("cms_entity", "cms_attribute").unwrap())
    }

    #[test]
    fn test_sqlite_insert_entity() {
        let s = statements(Dialect::Sqlite);
        assert_eq!(
            s.insert_entity,
            "INSERT INTO \"cms_entity\" (\"id\", \"entity_status\", \"entity_type\", \"entity_handle\", \"created_at\", \"updated_at\") VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
        );
    }

    #[test]
    fn test_postgres_update_binds_id_last() {
        let s = statements(Dialect::Postgres);
        assert_eq!(
            s.update_attribute,
            "UPDATE \"cms_attribute\" SET \"entity_id\" = $1, \"attribute_key\" = $2, \"attribute_value\" = $3, \"created_at\" = $4, \"updated_at\" = $5 WHERE \"id\" = $6"
        );
    }

    #[test]
    fn test_mysql_statements_are_unquoted() {
        let s = statements(Dialect::MySql);
        assert_eq!(s.delete_attributes, "DELETE FROM cms_attribute WHERE entity_id = ?");
        assert_eq!(s.count_entities, "SELECT COUNT(*) FROM cms_entity WHERE entity_type = ?");
        assert!(s.insert_entity_trash.starts_with("INSERT INTO cms_entity_trash ("));
        assert!(s.insert_entity_trash.ends_with("VALUES (?, ?, ?, ?, ?, ?, ?, ?)"));
    }

    #[test]
    fn test_attribute_lookup_orders_by_entity_id() {
        let s = statements(Dialect::Sqlite);
        assert!(s.find_entity_id_by_attribute.contains("INNER JOIN \"cms_entity\" e"));
        assert!(s.find_entity_id_by_attribute.ends_with("ORDER BY a.\"entity_id\" ASC LIMIT 1 OFFSET 0"));
    }

    #[test]
    fn test_in_list_placeholders() {
        let s = statements(Dialect::Postgres);
        assert!(s.select_entities_by_ids(3).contains("\"id\" IN ($1, $2, $3)"));
    }

    #[test]
    fn test_list_zero_limit_is_unbounded() {
        let s = statements(Dialect::Sqlite);
        let mut query = EntityQuery::new("post");
        query.limit = Some(0);
        assert!(s.list_entities(&query).ends_with("ORDER BY \"id\" ASC"));
    }

    #[test]
    fn test_list_defaults_to_id_ascending() {
        let s = statements(Dialect::Sqlite);
        let sql = s.list_entities(&EntityQuery::new("post").offset(10).limit(5));
        assert!(sql.ends_with("WHERE \"entity_type\" = ?1 ORDER BY \"id\" ASC LIMIT 5 OFFSET 10"));
    }

    #[test]
    fn test_list_with_search_and_secondary_order() {
        let s = statements(Dialect::Postgres);
        let query = EntityQuery::new("post")
            .search("hello")
            .order_by(OrderBy::CreatedAt, SortOrder::Desc);
        let sql = s.list_entities(&query);
        assert!(sql.contains("\"entity_handle\" LIKE $2 ESCAPE '!' OR \"id\" = $3"));
        assert!(sql.ends_with("ORDER BY \"created_at\" DESC, \"id\" ASC"));
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_contains("50%_off!"), "%50!%!_off!!%");
        assert_eq!(like_contains(""), "%%");
    }
}
