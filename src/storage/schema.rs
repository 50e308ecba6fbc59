//! Database schema definitions
//!
//! Four tables, all created with `IF NOT EXISTS`:
//! - `<entity>`(id, entity_status, entity_type, entity_handle, created_at, updated_at)
//! - `<attribute>`(id, entity_id, attribute_key, attribute_value, created_at, updated_at)
//! - `<entity>_trash`, `<attribute>_trash`: the same columns plus deleted_at, deleted_by

use crate::dialect::Dialect;
use crate::{Error, Result};

/// Suffix appended to live table names to get their trash tables
pub const TRASH_SUFFIX: &str = "_trash";

/// The four table names a store works with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    pub entity: String,
    pub attribute: String,
    pub entity_trash: String,
    pub attribute_trash: String,
}

impl TableNames {
    /// Derive all four names from the two live tables. Both must be non-empty.
    pub fn new(entity: impl Into<String>, attribute: impl Into<String>) -> Result<Self> {
        let entity = entity.into();
        let attribute = attribute.into();

        if entity.trim().is_empty() {
            return Err(Error::Config("entity table name is required".to_string()));
        }
        if attribute.trim().is_empty() {
            return Err(Error::Config("attribute table name is required".to_string()));
        }

        Ok(Self {
            entity_trash: format!("{}{}", entity, TRASH_SUFFIX),
            attribute_trash: format!("{}{}", attribute, TRASH_SUFFIX),
            entity,
            attribute,
        })
    }
}

const ENTITY_COLUMNS: &[(&str, &str)] = &[
    ("entity_status", "varchar(10) NOT NULL"),
    ("entity_type", "varchar(40) NOT NULL"),
    ("entity_handle", "varchar(60) DEFAULT ''"),
];

const ATTRIBUTE_COLUMNS: &[(&str, &str)] = &[
    ("entity_id", "varchar(40) NOT NULL"),
    ("attribute_key", "varchar(255) NOT NULL"),
    ("attribute_value", "text"),
];

fn create_table(dialect: Dialect, table: &str, columns: &[(&str, &str)], trash: bool) -> String {
    let ts = dialect.timestamp_type();
    let q = |c: &str| dialect.quote(c);

    // Trash rows are an append-only log, the same id may appear many times
    let id_type = if trash {
        "varchar(40) NOT NULL"
    } else {
        "varchar(40) NOT NULL PRIMARY KEY"
    };

    let mut defs = vec![format!("{} {}", q("id"), id_type)];
    defs.extend(columns.iter().map(|(name, ty)| format!("{} {}", q(name), ty)));
    defs.push(format!("{} {} NOT NULL", q("created_at"), ts));
    defs.push(format!("{} {} NOT NULL", q("updated_at"), ts));
    if trash {
        defs.push(format!("{} {} NOT NULL", q("deleted_at"), ts));
        defs.push(format!("{} varchar(40)", q("deleted_by")));
    }

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
        q(table),
        defs.join(",\n    ")
    )
}

/// All schema creation statements for a dialect
pub fn create_table_statements(dialect: Dialect, tables: &TableNames) -> Result<Vec<String>> {
    dialect.ensure_supported()?;

    let entity = create_table(dialect, &tables.entity, ENTITY_COLUMNS, false);
    let attribute = create_table(dialect, &tables.attribute, ATTRIBUTE_COLUMNS, false);
    let entity_trash = create_table(dialect, &tables.entity_trash, ENTITY_COLUMNS, true);
    let attribute_trash = create_table(dialect, &tables.attribute_trash, ATTRIBUTE_COLUMNS, true);

    let stmts = match dialect {
        Dialect::MySql => vec![entity, attribute, entity_trash, attribute_trash],
        _ => vec![attribute, entity, entity_trash, attribute_trash],
    };
    Ok(stmts)
}
