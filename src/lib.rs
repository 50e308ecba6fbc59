//! # Entitystore - Entity-Attribute-Value storage over SQL
//!
//! Entities carry a fixed envelope (status, type, handle, timestamps) and an
//! open-ended bag of typed attributes, each stored as its own key/value row.
//!
//! Entitystore provides:
//! - Dialect-aware DDL and DML generation (MySQL, Postgres, SQLite)
//! - Idempotent schema provisioning for the four store tables
//! - Transactional create/update/upsert of entities and attributes
//! - Soft deletes that move an entity and its attributes into trash tables
//!
//! ```no_run
//! use entitystore::Store;
//! use rusqlite::Connection;
//!
//! # fn main() -> entitystore::Result<()> {
//! let store = Store::builder(Connection::open("cms.db")?)
//!     .entity_table("cms_entity")
//!     .attribute_table("cms_attribute")
//!     .auto_migrate(true)
//!     .build()?;
//!
//! let post = store.create_with_attributes("post", [("name", "Hello world")])?;
//! store.set_int(&post.id, "views", 5)?;
//! store.trash(&post.id)?;
//! # Ok(())
//! # }
//! ```

pub mod attribute;
pub mod codec;
pub mod config;
pub mod dialect;
pub mod entity;
pub mod id;
pub mod observer;
pub mod storage;

// Re-exports for convenient access
pub use attribute::{Attribute, AttributeTrash};
pub use codec::{AttributeValue, ValueKind};
pub use config::StoreConfig;
pub use dialect::{Dialect, Driver};
pub use entity::{Entity, EntityQuery, EntityStatus, EntityTrash, OrderBy, SortOrder};
pub use id::{IdGenerator, RandomIds, TimeOrderedIds};
pub use observer::{SqlObserver, TracingObserver};
pub use storage::{Store, StoreBuilder, TableNames};

/// Result type alias for Entitystore operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Entitystore operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported dialect: {0}")]
    UnsupportedDialect(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Failed to insert entity {}: {source}", .entity.id)]
    EntityInsert {
        entity: Box<Entity>,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Transaction aborted: {source}; rollback failed: {rollback}")]
    Rollback {
        #[source]
        source: Box<Error>,
        rollback: rusqlite::Error,
    },

    #[error("Schema provisioning: {failed} statement(s) failed, first: {first}")]
    Migration { failed: usize, first: rusqlite::Error },

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
