//! CQL (Cassandra/Scylla-family) reference adapter.
//!
//! No transactions and no server-side lock primitive, so this backend
//! provides a pass-through "transaction" whose commit/rollback are no-ops
//! and whose exec routes straight to the session, keeping this driver on
//! the same code path as the transactional ones.
//!
//! Backed by the `scylla` driver, the actively-maintained async CQL client
//! for Rust.

use super::{Adapter, Backend, LockConn, Tx};
use crate::error::{EngineError, Result};
use async_trait::async_trait;
use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use std::sync::Arc;

pub struct CqlAdapter;

#[async_trait]
impl Adapter for CqlAdapter {
    fn name(&self) -> &'static str {
        "cql"
    }

    fn create_versions_table_sql(&self, _schema: Option<&str>) -> String {
        "CREATE TABLE IF NOT EXISTS dbmigrate_versions (version text, PRIMARY KEY (version))"
            .to_string()
    }

    fn select_existing_versions_sql(&self, _schema: Option<&str>) -> String {
        "SELECT version FROM dbmigrate_versions".to_string()
    }

    fn insert_new_version_sql(&self, _schema: Option<&str>) -> String {
        "INSERT INTO dbmigrate_versions (version) VALUES (?)".to_string()
    }

    fn delete_old_version_sql(&self, _schema: Option<&str>) -> String {
        "DELETE FROM dbmigrate_versions WHERE version = ?".to_string()
    }

    fn base_database_url(&self, url: &str) -> Option<Result<(String, String)>> {
        // The always-present administrative keyspace is `system`.
        Some(crate::url::rewrite_keyspace(url, "system"))
    }

    fn supports_locking(&self) -> bool {
        false
    }

    async fn connect(&self, url: &str) -> Result<Arc<dyn Backend>> {
        let session = SessionBuilder::new()
            .known_node(url)
            .build()
            .await
            .map_err(|e| EngineError::Connection(e.to_string()))?;
        Ok(Arc::new(CqlBackend {
            session: Arc::new(session),
        }))
    }
}

struct CqlBackend {
    session: Arc<Session>,
}

async fn run(session: &Session, sql: &str) -> Result<()> {
    session
        .query_unpaged(sql.to_string(), ())
        .await
        .map_err(|e| EngineError::Connection(e.to_string()))?;
    Ok(())
}

async fn run_with_version(session: &Session, sql: &str, version: &str) -> Result<()> {
    session
        .query_unpaged(sql.to_string(), (version,))
        .await
        .map_err(|e| EngineError::Connection(e.to_string()))?;
    Ok(())
}

#[async_trait]
impl Backend for CqlBackend {
    async fn execute(&self, sql: &str) -> Result<()> {
        run(&self.session, sql).await
    }

    async fn query_versions(&self, sql: &str) -> Result<Vec<String>> {
        let result = self
            .session
            .query_unpaged(sql.to_string(), ())
            .await
            .map_err(|e| EngineError::VersionsLoad(e.into()))?;
        let rows = result
            .into_rows_result()
            .map_err(|e| EngineError::VersionsLoad(e.into()))?;
        let mut out = Vec::new();
        for row in rows
            .rows::<(String,)>()
            .map_err(|e| EngineError::VersionsLoad(e.into()))?
        {
            let (version,) = row.map_err(|e| EngineError::VersionsLoad(e.into()))?;
            out.push(version);
        }
        Ok(out)
    }

    async fn insert_version(&self, sql: &str, version: &str) -> Result<()> {
        run_with_version(&self.session, sql, version)
            .await
            .map_err(|e| match e {
                EngineError::Connection(msg) => EngineError::RegisterVersion {
                    version: version.to_string(),
                    source: anyhow::anyhow!(msg),
                },
                other => other,
            })
    }

    async fn delete_version(&self, sql: &str, version: &str) -> Result<()> {
        run_with_version(&self.session, sql, version)
            .await
            .map_err(|e| match e {
                EngineError::Connection(msg) => EngineError::UnregisterVersion {
                    version: version.to_string(),
                    source: anyhow::anyhow!(msg),
                },
                other => other,
            })
    }

    async fn begin(&self) -> Result<Box<dyn Tx>> {
        Ok(Box::new(CqlPassthroughTx {
            session: self.session.clone(),
        }))
    }

    async fn lock_connection(&self) -> Result<Box<dyn LockConn>> {
        Err(EngineError::LockingNotSupported("cql".to_string()))
    }
}

/// No-op transaction wrapper: CQL has no `BEGIN`/`COMMIT`, so every
/// statement runs directly against the session and commit/rollback are
/// no-ops. Kept as a type so the runner's three execution strategies don't
/// need a CQL-specific code path.
struct CqlPassthroughTx {
    session: Arc<Session>,
}

#[async_trait]
impl Tx for CqlPassthroughTx {
    async fn execute(&mut self, sql: &str) -> Result<()> {
        run(&self.session, sql).await
    }

    async fn insert_version(&mut self, sql: &str, version: &str) -> Result<()> {
        run_with_version(&self.session, sql, version)
            .await
            .map_err(|e| match e {
                EngineError::Connection(msg) => EngineError::RegisterVersion {
                    version: version.to_string(),
                    source: anyhow::anyhow!(msg),
                },
                other => other,
            })
    }

    async fn delete_version(&mut self, sql: &str, version: &str) -> Result<()> {
        run_with_version(&self.session, sql, version)
            .await
            .map_err(|e| match e {
                EngineError::Connection(msg) => EngineError::UnregisterVersion {
                    version: version.to_string(),
                    source: anyhow::anyhow!(msg),
                },
                other => other,
            })
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}
