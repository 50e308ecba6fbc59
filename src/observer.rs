//! Statement observers
//!
//! The store reports every statement it runs, and every failure, to an
//! observer. Observers only watch; they never change control flow.

use tracing::{debug, warn};

/// Receives every statement the store runs.
///
/// Callbacks run while the store holds its connection lock. An observer
/// must not call back into the same [`crate::Store`]; doing so deadlocks.
pub trait SqlObserver: Send + Sync {
    /// Called before a statement is executed
    fn statement(&self, sql: &str);

    /// Called when a statement fails
    fn error(&self, sql: &str, err: &rusqlite::Error);
}

/// Reports through `tracing` under the `entitystore::sql` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl SqlObserver for TracingObserver {
    fn statement(&self, sql: &str) {
        debug!(target: "entitystore::sql", sql = sql.trim(), "executing statement");
    }

    fn error(&self, sql: &str, err: &rusqlite::Error) {
        warn!(target: "entitystore::sql", sql = sql.trim(), error = %err, "statement failed");
    }
}

/// Observer used when verbose logging is off.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct SilentObserver;

impl SqlObserver for SilentObserver {
    fn statement(&self, _sql: &str) {}

    fn error(&self, _sql: &str, _err: &rusqlite::Error) {}
}
