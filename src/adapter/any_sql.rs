//! Shared backend for the three `sqlx`-driven dialects (Postgres, MySQL,
//! SQLite). The per-driver `Adapter` impls differ only in SQL text, admin
//! URL handling, and the lock SQL pair; the connection/transaction/lock
//! machinery below is identical across all three, which is the point of
//! `sqlx::Any` — one pool type, driver chosen at runtime by URL scheme.

use super::{Backend, LockConn, Tx};
use crate::error::{EngineError, Result};
use async_trait::async_trait;
use sqlx::any::{AnyPoolOptions, AnyRow};
use sqlx::{Any, Row};

/// A transaction that self-committed through a side channel reports this
/// string on `COMMIT` rather than success; treat it as success rather than
/// an error. Checked unconditionally since it can never occur verbatim on
/// MySQL or SQLite.
const PG_IDLE_COMMIT_QUIRK: &str = "pq: unexpected transaction status idle";

/// SQL pair used to try/release an advisory lock. `None` for drivers with no
/// server-side lock primitive.
pub(super) type LockSql = Option<(&'static str, &'static str)>;

pub(super) struct AnySqlBackend {
    pool: sqlx::Pool<Any>,
    lock_sql: LockSql,
}

impl AnySqlBackend {
    pub(super) async fn connect(url: &str, lock_sql: LockSql) -> Result<Self> {
        sqlx::any::install_default_drivers();
        let pool = AnyPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await
            .map_err(|e| EngineError::Connection(e.to_string()))?;
        Ok(Self { pool, lock_sql })
    }
}

fn first_text_column(row: &AnyRow) -> std::result::Result<String, sqlx::Error> {
    row.try_get::<String, _>(0)
}

#[async_trait]
impl Backend for AnySqlBackend {
    async fn execute(&self, sql: &str) -> Result<()> {
        sqlx::query(sql)
            .execute(&self.pool)
            .await
            .map_err(|e| EngineError::Connection(e.to_string()))?;
        Ok(())
    }

    async fn query_versions(&self, sql: &str) -> Result<Vec<String>> {
        let rows = sqlx::query(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| EngineError::VersionsLoad(e.into()))?;
        rows.iter()
            .map(|r| first_text_column(r).map_err(|e| EngineError::VersionsLoad(e.into())))
            .collect()
    }

    async fn insert_version(&self, sql: &str, version: &str) -> Result<()> {
        sqlx::query(sql)
            .bind(version)
            .execute(&self.pool)
            .await
            .map_err(|e| EngineError::RegisterVersion {
                version: version.to_string(),
                source: e.into(),
            })?;
        Ok(())
    }

    async fn delete_version(&self, sql: &str, version: &str) -> Result<()> {
        sqlx::query(sql)
            .bind(version)
            .execute(&self.pool)
            .await
            .map_err(|e| EngineError::UnregisterVersion {
                version: version.to_string(),
                source: e.into(),
            })?;
        Ok(())
    }

    async fn begin(&self) -> Result<Box<dyn Tx>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| EngineError::Connection(e.to_string()))?;
        Ok(Box::new(AnySqlTx { tx: Some(tx) }))
    }

    async fn lock_connection(&self) -> Result<Box<dyn LockConn>> {
        let (try_sql, release_sql) = self
            .lock_sql
            .expect("lock_connection called on a driver without lock SQL");
        let conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| EngineError::Connection(e.to_string()))?;
        Ok(Box::new(AnySqlLockConn {
            conn,
            try_sql,
            release_sql,
        }))
    }
}

struct AnySqlTx {
    tx: Option<sqlx::Transaction<'static, Any>>,
}

#[async_trait]
impl Tx for AnySqlTx {
    async fn execute(&mut self, sql: &str) -> Result<()> {
        let tx = self.tx.as_mut().expect("transaction already finished");
        sqlx::query(sql)
            .execute(&mut **tx)
            .await
            .map_err(|e| EngineError::Connection(e.to_string()))?;
        Ok(())
    }

    async fn insert_version(&mut self, sql: &str, version: &str) -> Result<()> {
        let tx = self.tx.as_mut().expect("transaction already finished");
        sqlx::query(sql)
            .bind(version)
            .execute(&mut **tx)
            .await
            .map_err(|e| EngineError::RegisterVersion {
                version: version.to_string(),
                source: e.into(),
            })?;
        Ok(())
    }

    async fn delete_version(&mut self, sql: &str, version: &str) -> Result<()> {
        let tx = self.tx.as_mut().expect("transaction already finished");
        sqlx::query(sql)
            .bind(version)
            .execute(&mut **tx)
            .await
            .map_err(|e| EngineError::UnregisterVersion {
                version: version.to_string(),
                source: e.into(),
            })?;
        Ok(())
    }

    async fn commit(mut self: Box<Self>, ) -> Result<()> {
        let tx = self.tx.take().expect("transaction already finished");
        match tx.commit().await {
            Ok(()) => Ok(()),
            Err(e) if e.to_string().contains(PG_IDLE_COMMIT_QUIRK) => Ok(()),
            Err(e) => Err(EngineError::Connection(e.to_string())),
        }
    }

    async fn rollback(mut self: Box<Self>) -> Result<()> {
        let tx = self.tx.take().expect("transaction already finished");
        tx.rollback()
            .await
            .map_err(|e| EngineError::Connection(e.to_string()))?;
        Ok(())
    }
}

struct AnySqlLockConn {
    conn: sqlx::pool::PoolConnection<Any>,
    try_sql: &'static str,
    release_sql: &'static str,
}

#[async_trait]
impl LockConn for AnySqlLockConn {
    async fn try_acquire(&mut self, lock_id: &str) -> Result<bool> {
        let result: String = sqlx::query(self.try_sql)
            .bind(lock_id)
            .fetch_one(&mut *self.conn)
            .await
            .map_err(|e| EngineError::LockAcquire(e.to_string()))
            .and_then(|row| {
                first_text_column(&row).map_err(|e| EngineError::LockAcquire(e.to_string()))
            })?;
        Ok(result == "t" || result == "1" || result.eq_ignore_ascii_case("true"))
    }

    async fn release(&mut self, lock_id: &str) -> Result<()> {
        let _ = sqlx::query(self.release_sql)
            .bind(lock_id)
            .execute(&mut *self.conn)
            .await;
        Ok(())
    }
}
