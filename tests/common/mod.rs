//! Common test utilities.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use entitystore::Store;
use rusqlite::Connection;
use tempfile::TempDir;

pub const ENTITY_TABLE: &str = "cms_entity";
pub const ATTRIBUTE_TABLE: &str = "cms_attribute";

/// Create a migrated in-memory store.
pub fn memory_store() -> Store {
    Store::builder(Connection::open_in_memory().unwrap())
        .entity_table(ENTITY_TABLE)
        .attribute_table(ATTRIBUTE_TABLE)
        .auto_migrate(true)
        .build()
        .unwrap()
}

/// Ids that sort in creation order: `id-000001`, `id-000002`, ...
pub fn sequential_ids() -> impl Fn() -> String + Send + Sync + 'static {
    let counter = AtomicU64::new(0);
    move || format!("id-{:06}", counter.fetch_add(1, Ordering::SeqCst) + 1)
}

/// A migrated store backed by a file, so a second connection can reach the
/// same database to install triggers and inspect raw rows.
pub struct FileStore {
    pub store: Store,
    pub path: PathBuf,
    _dir: TempDir,
}

impl FileStore {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("entitystore.db");
        let store = Store::builder(Connection::open(&path).unwrap())
            .entity_table(ENTITY_TABLE)
            .attribute_table(ATTRIBUTE_TABLE)
            .auto_migrate(true)
            .build()
            .unwrap();

        Self {
            store,
            path,
            _dir: dir,
        }
    }

    pub fn side_connection(&self) -> Connection {
        Connection::open(&self.path).unwrap()
    }

    /// Make every statement matching `event` on `table` abort when `when` holds.
    pub fn inject_failure(&self, name: &str, event: &str, table: &str, when: &str) {
        let sql = format!(
            "CREATE TRIGGER {name} {event} ON \"{table}\" WHEN {when} \
             BEGIN SELECT RAISE(ABORT, 'injected failure'); END;"
        );
        self.side_connection().execute_batch(&sql).unwrap();
    }

    pub fn row_count(&self, table: &str) -> i64 {
        self.side_connection()
            .query_row(&format!("SELECT COUNT(*) FROM \"{table}\""), [], |row| row.get(0))
            .unwrap()
    }
}
