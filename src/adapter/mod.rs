//! Driver-adapter abstraction and the process-wide registry.
//!
//! Each adapter is a record of pure dialect functions plus a handful of
//! async hooks for connecting, transactions, and locking. Capability that a
//! driver lacks (no admin DB, no locking, ...) is represented as `None` /
//! `false`, never as a missing trait impl — a capability-flagged record
//! rather than a capability-interface hierarchy.

mod any_sql;
mod cql;
mod mysql;
mod postgres;
mod registry;
mod sqlite;

pub use registry::{lookup, DRIVER_CQL, DRIVER_MYSQL, DRIVER_POSTGRES, DRIVER_SQLITE3};

use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// A single statement, already executed, with bookkeeping not yet applied.
#[async_trait]
pub trait Tx: Send {
    async fn execute(&mut self, sql: &str) -> Result<()>;
    async fn insert_version(&mut self, sql: &str, version: &str) -> Result<()>;
    async fn delete_version(&mut self, sql: &str, version: &str) -> Result<()>;
    async fn commit(self: Box<Self>) -> Result<()>;
    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// A connection pinned for the duration of lock hold.
#[async_trait]
pub trait LockConn: Send {
    /// Attempt to acquire the named lock without blocking. Returns whether
    /// it was obtained; the caller (lock manager) owns the polling loop.
    async fn try_acquire(&mut self, lock_id: &str) -> Result<bool>;
    /// Best-effort release; caller discards any error.
    async fn release(&mut self, lock_id: &str) -> Result<()>;
}

/// An open connection/pool to one database, opaque to the runner.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn execute(&self, sql: &str) -> Result<()>;
    /// Runs `sql`, returning every value of its single text column.
    async fn query_versions(&self, sql: &str) -> Result<Vec<String>>;
    async fn insert_version(&self, sql: &str, version: &str) -> Result<()>;
    async fn delete_version(&self, sql: &str, version: &str) -> Result<()>;
    /// Begins a transaction. For transaction-less databases (CQL) this is a
    /// pass-through whose commit/rollback are no-ops and whose exec routes
    /// straight to the pool, so runner code paths stay uniform.
    async fn begin(&self) -> Result<Box<dyn Tx>>;
    /// Pins a connection for lock hold. Only called when
    /// `Adapter::supports_locking()` is true.
    async fn lock_connection(&self) -> Result<Box<dyn LockConn>>;
}

/// Dialect-specific SQL fragments, transaction factory, locking primitives,
/// and URL surgery for one database backend.
#[async_trait]
pub trait Adapter: Send + Sync {
    fn name(&self) -> &'static str;

    fn create_versions_table_sql(&self, schema: Option<&str>) -> String;
    fn select_existing_versions_sql(&self, schema: Option<&str>) -> String;
    fn insert_new_version_sql(&self, schema: Option<&str>) -> String;
    fn delete_old_version_sql(&self, schema: Option<&str>) -> String;

    /// Empty/`None` means the driver does not support readiness polling.
    fn ping_query(&self) -> Option<&'static str> {
        None
    }
    /// `None` means the driver does not support `-create-db`.
    fn create_database_query(&self, _name: &str) -> Option<String> {
        None
    }
    fn create_schema_query(&self, _name: &str) -> Option<String> {
        None
    }
    /// Produces an admin-database URL and the extracted target database
    /// name. `None` means the driver has no admin operations.
    fn base_database_url(&self, _url: &str) -> Option<Result<(String, String)>> {
        None
    }

    fn supports_locking(&self) -> bool;

    /// Opens the connection pool/session for this driver.
    async fn connect(&self, url: &str) -> Result<Arc<dyn Backend>>;
}

pub(crate) const DBMIGRATE_VERSIONS_TABLE: &str = "dbmigrate_versions";

pub(crate) fn qualified_table(schema: Option<&str>) -> String {
    match schema {
        Some(s) if !s.is_empty() => format!("{s}.{DBMIGRATE_VERSIONS_TABLE}"),
        _ => DBMIGRATE_VERSIONS_TABLE.to_string(),
    }
}
