//! Storage Layer - EAV persistence over SQL
//!
//! Four tables per store:
//! - `<entity>`(id, entity_status, entity_type, entity_handle, created_at, updated_at)
//! - `<attribute>`(id, entity_id, attribute_key, attribute_value, created_at, updated_at)
//! - `<entity>_trash`, `<attribute>_trash`: copies plus deleted_at, deleted_by

pub mod schema;
mod statements;
mod store;
mod entities;
mod attributes;
mod trash;

pub use schema::{TableNames, create_table_statements};
pub use store::{Store, StoreBuilder};
