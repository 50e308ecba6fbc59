//! Entity types
//!
//! An entity is the fixed envelope every attribute hangs off: an id, a
//! status, a type, an optional handle and two timestamps. Entities are plain
//! data; all queries go through [`crate::Store`].

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Lifecycle status of a live entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityStatus {
    #[default]
    Active,
    Inactive,
}

impl EntityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityStatus::Active => "active",
            EntityStatus::Inactive => "inactive",
        }
    }
}

impl FromStr for EntityStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "active" => Ok(EntityStatus::Active),
            "inactive" => Ok(EntityStatus::Inactive),
            _ => Err(Error::InvalidInput(format!("Unknown entity status: {}", s))),
        }
    }
}

impl std::fmt::Display for EntityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A live entity row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Globally unique, never changes
    pub id: String,
    pub status: EntityStatus,
    /// Entity type, e.g. `"post"`
    pub entity_type: String,
    /// Optional handle, unique within the type by convention
    pub handle: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity {
    /// Create a new active entity stamped with the current time
    pub fn new(id: impl Into<String>, entity_type: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            status: EntityStatus::Active,
            entity_type: entity_type.into(),
            handle: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_handle(mut self, handle: impl Into<String>) -> Self {
        self.handle = Some(handle.into());
        self
    }

    pub fn with_status(mut self, status: EntityStatus) -> Self {
        self.status = status;
        self
    }
}

/// Soft-deleted copy of an entity, kept in the entity trash table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityTrash {
    pub id: String,
    pub status: EntityStatus,
    pub entity_type: String,
    pub handle: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: DateTime<Utc>,
    pub deleted_by: Option<String>,
}

impl EntityTrash {
    pub fn from_entity(entity: &Entity, deleted_at: DateTime<Utc>, deleted_by: Option<&str>) -> Self {
        Self {
            id: entity.id.clone(),
            status: entity.status,
            entity_type: entity.entity_type.clone(),
            handle: entity.handle.clone(),
            created_at: entity.created_at,
            updated_at: entity.updated_at,
            deleted_at,
            deleted_by: deleted_by.map(str::to_string),
        }
    }
}

/// Column an entity listing is ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrderBy {
    #[default]
    Id,
    Handle,
    Status,
    CreatedAt,
    UpdatedAt,
}

impl OrderBy {
    /// Column name in the entity table
    pub fn column(&self) -> &'static str {
        match self {
            OrderBy::Id => "id",
            OrderBy::Handle => "entity_handle",
            OrderBy::Status => "entity_status",
            OrderBy::CreatedAt => "created_at",
            OrderBy::UpdatedAt => "updated_at",
        }
    }
}

impl FromStr for OrderBy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "" | "id" => Ok(OrderBy::Id),
            "handle" | "entity_handle" => Ok(OrderBy::Handle),
            "status" | "entity_status" => Ok(OrderBy::Status),
            "created_at" => Ok(OrderBy::CreatedAt),
            "updated_at" => Ok(OrderBy::UpdatedAt),
            _ => Err(Error::InvalidInput(format!("Unknown order column: {}", s))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "" | "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(Error::InvalidInput(format!("Unknown sort order: {}", s))),
        }
    }
}

/// Parameters for [`crate::Store::list`].
///
/// - `search` matches a substring of the handle, or the exact id. On SQLite
///   (and MySQL's default collations) the handle match ignores ASCII case;
///   Postgres `LIKE` is case-sensitive. The id match is always exact.
/// - `order_by`/`sort` pick the primary ordering; ties always break on id ascending
/// - `limit: None` (or `Some(0)`) returns everything after `offset`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityQuery {
    pub entity_type: String,
    pub offset: u64,
    pub limit: Option<u64>,
    pub search: Option<String>,
    pub order_by: OrderBy,
    pub sort: SortOrder,
}

impl EntityQuery {
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            ..Default::default()
        }
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    /// Page size; `0` clears the limit
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = if limit == 0 { None } else { Some(limit) };
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        self.search = if search.is_empty() { None } else { Some(search) };
        self
    }

    pub fn order_by(mut self, order_by: OrderBy, sort: SortOrder) -> Self {
        self.order_by = order_by;
        self.sort = sort;
        self
    }
}
