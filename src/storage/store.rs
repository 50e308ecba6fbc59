//! Store construction, connection access and transactions

use super::schema::{self, TableNames};
use super::statements::Statements;
use crate::config::StoreConfig;
use crate::dialect::Dialect;
use crate::id::{IdGenerator, TimeOrderedIds};
use crate::observer::{SilentObserver, SqlObserver, TracingObserver};
use crate::{Error, Result};
use rusqlite::{Connection, OptionalExtension, Params, Row, TransactionBehavior};
use std::sync::{Arc, Mutex, MutexGuard};

/// Entity-attribute-value store over a SQL connection.
///
/// The store owns the connection. Every call locks it, runs its statements
/// (inside one transaction when there is more than one write) and releases
/// it; nothing is held open between calls.
pub struct Store {
    conn: Mutex<Connection>,
    dialect: Dialect,
    tables: TableNames,
    pub(crate) sql: Statements,
    observer: Arc<dyn SqlObserver>,
    ids: Arc<dyn IdGenerator>,
}

/// Builder for [`Store`].
pub struct StoreBuilder {
    conn: Connection,
    entity_table: String,
    attribute_table: String,
    auto_migrate: bool,
    verbose: bool,
    observer: Option<Arc<dyn SqlObserver>>,
    ids: Option<Arc<dyn IdGenerator>>,
}

impl StoreBuilder {
    pub fn entity_table(mut self, name: impl Into<String>) -> Self {
        self.entity_table = name.into();
        self
    }

    pub fn attribute_table(mut self, name: impl Into<String>) -> Self {
        self.attribute_table = name.into();
        self
    }

    /// Create the four tables when the store is built
    pub fn auto_migrate(mut self, enabled: bool) -> Self {
        self.auto_migrate = enabled;
        self
    }

    /// Report statements and failures through `tracing`
    pub fn verbose(mut self, enabled: bool) -> Self {
        self.verbose = enabled;
        self
    }

    /// Report statements to a custom observer. Takes precedence over `verbose`.
    pub fn observer(mut self, observer: impl SqlObserver + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    pub fn id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Some(Arc::new(ids));
        self
    }

    pub fn with_config(self, config: &StoreConfig) -> Self {
        self.entity_table(config.entity_table.clone())
            .attribute_table(config.attribute_table.clone())
            .auto_migrate(config.auto_migrate)
            .verbose(config.verbose)
    }

    pub fn build(self) -> Result<Store> {
        let tables = TableNames::new(self.entity_table, self.attribute_table)?;
        let dialect = Dialect::resolve(&self.conn)?;
        dialect.ensure_supported()?;

        let observer = match (self.observer, self.verbose) {
            (Some(observer), _) => observer,
            (None, true) => Arc::new(TracingObserver) as Arc<dyn SqlObserver>,
            (None, false) => Arc::new(SilentObserver),
        };

        let store = Store {
            sql: Statements::new(dialect, &tables),
            conn: Mutex::new(self.conn),
            dialect,
            tables,
            observer,
            ids: self.ids.unwrap_or_else(|| Arc::new(TimeOrderedIds)),
        };

        if self.auto_migrate {
            if let Err(e) = store.auto_migrate() {
                tracing::warn!("Schema provisioning incomplete: {}", e);
            }
        }

        Ok(store)
    }
}

impl Store {
    pub fn builder(conn: Connection) -> StoreBuilder {
        StoreBuilder {
            conn,
            entity_table: String::new(),
            attribute_table: String::new(),
            auto_migrate: false,
            verbose: false,
            observer: None,
            ids: None,
        }
    }

    /// Build a store from a loaded [`StoreConfig`]
    pub fn from_config(conn: Connection, config: &StoreConfig) -> Result<Self> {
        Self::builder(conn).with_config(config).build()
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn tables(&self) -> &TableNames {
        &self.tables
    }

    /// CREATE TABLE statements for this store's dialect and tables
    pub fn create_table_statements(&self) -> Result<Vec<String>> {
        schema::create_table_statements(self.dialect, &self.tables)
    }

    /// Create the four tables, best effort.
    ///
    /// Every statement is attempted even when an earlier one fails; the
    /// first failure is returned once all have run.
    pub fn auto_migrate(&self) -> Result<()> {
        let stmts = self.create_table_statements()?;
        let conn = self.lock();

        let mut failures = Vec::new();
        for sql in &stmts {
            self.observer.statement(sql);
            if let Err(err) = conn.execute(sql, []) {
                self.observer.error(sql, &err);
                failures.push(err);
            }
        }

        let failed = failures.len();
        match failures.into_iter().next() {
            None => Ok(()),
            Some(first) => Err(Error::Migration { failed, first }),
        }
    }

    pub(crate) fn next_id(&self) -> String {
        self.ids.next_id()
    }

    /// Lock the connection. A panic in an earlier call poisons the mutex, but
    /// an open transaction was already rolled back when it was dropped, so
    /// the connection is reused.
    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("connection lock poisoned by an earlier panic, recovering");
            self.conn.clear_poison();
            poisoned.into_inner()
        })
    }

    // ========== Connection & Transaction Scopes ==========

    /// Run `f` against the connection outside any explicit transaction
    pub(crate) fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.lock();
        f(&*conn)
    }

    /// Run `f` inside one transaction.
    ///
    /// Commits when `f` succeeds, rolls back when it fails. A panic inside
    /// `f` drops the transaction, which also rolls it back. The caller sees
    /// the original error; a failed rollback is reported alongside it.
    pub(crate) fn with_transaction<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let mut conn = self.lock();
        self.observer.statement("BEGIN IMMEDIATE");
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| self.failed("BEGIN IMMEDIATE", e))?;

        match f(&*tx) {
            Ok(value) => {
                self.observer.statement("COMMIT");
                tx.commit().map_err(|e| self.failed("COMMIT", e))?;
                Ok(value)
            }
            Err(err) => {
                self.observer.statement("ROLLBACK");
                match tx.rollback() {
                    Ok(()) => Err(err),
                    Err(rollback) => {
                        self.observer.error("ROLLBACK", &rollback);
                        Err(Error::Rollback {
                            source: Box::new(err),
                            rollback,
                        })
                    }
                }
            }
        }
    }

    // ========== Observed Execution ==========

    pub(crate) fn failed(&self, sql: &str, err: rusqlite::Error) -> Error {
        self.observer.error(sql, &err);
        Error::Storage(err)
    }

    pub(crate) fn execute<P: Params>(&self, conn: &Connection, sql: &str, params: P) -> Result<usize> {
        self.observer.statement(sql);
        conn.execute(sql, params).map_err(|e| self.failed(sql, e))
    }

    pub(crate) fn query_opt<T, P, F>(&self, conn: &Connection, sql: &str, params: P, f: F) -> Result<Option<T>>
    where
        P: Params,
        F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    {
        self.observer.statement(sql);
        conn.query_row(sql, params, f)
            .optional()
            .map_err(|e| self.failed(sql, e))
    }

    pub(crate) fn query_all<T, P, F>(&self, conn: &Connection, sql: &str, params: P, f: F) -> Result<Vec<T>>
    where
        P: Params,
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        self.observer.statement(sql);
        let result = (|| -> rusqlite::Result<Vec<T>> {
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt.query_map(params, f)?;
            rows.collect()
        })();
        result.map_err(|e| self.failed(sql, e))
    }
}
