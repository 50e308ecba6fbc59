//! Identifier generation
//!
//! Ids are produced by an injected generator so callers can choose between
//! lexically ordered and random identifiers, or supply their own.

use uuid::Uuid;

/// Produces globally unique ids for entities and attributes.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// UUIDv7 ids; later ids sort after earlier ones. The default generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeOrderedIds;

impl IdGenerator for TimeOrderedIds {
    fn next_id(&self) -> String {
        Uuid::now_v7().simple().to_string()
    }
}

/// UUIDv4 ids with no ordering.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn next_id(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}

impl<F> IdGenerator for F
where
    F: Fn() -> String + Send + Sync,
{
    fn next_id(&self) -> String {
        self()
    }
}
