//! Cross-process advisory lock manager.
//!
//! Invoked at the start of up/down execution, after the engine handle is
//! constructed but before the versions store is loaded. Behaviour is keyed
//! on `(no_lock, supports_locking)`:
//!
//! | no_lock | supports_locking | action |
//! |---|---|---|
//! | true  | true  | warn "running without locking", proceed unpinned |
//! | true  | false | proceed silently |
//! | false | true  | pin a connection, acquire, defer release |
//! | false | false | fail with `LockingNotSupported` — no execution attempted |

use crate::adapter::{Adapter, Backend, LockConn};
use crate::error::{EngineError, Result};
use crate::notify::Notify;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Used when a caller doesn't have an `EngineConfig` to hand (e.g. the
/// `from_parts` embedding path); matches `EngineConfig`'s own default.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Deterministic lock key derived from `(database, schema?, table)`.
///
/// Concatenates the three with a NUL separator and takes the CRC32,
/// formatted as a decimal string — the exact same derivation must be used
/// on acquire and release. Distinct database/schema pairs get distinct
/// locks; collisions are astronomically unlikely within a single
/// deployment but not guaranteed absent.
pub fn lock_id(database: &str, schema: Option<&str>, table: &str) -> String {
    let mut buf = Vec::with_capacity(database.len() + table.len() + 2);
    buf.extend_from_slice(database.as_bytes());
    buf.push(0);
    if let Some(s) = schema.filter(|s| !s.is_empty()) {
        buf.extend_from_slice(s.as_bytes());
        buf.push(0);
    }
    buf.extend_from_slice(table.as_bytes());

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&buf);
    hasher.finalize().to_string()
}

/// An acquired lock. Dropping it does not release anything — call
/// [`Held::release`] explicitly during teardown so failures can be logged
/// and then discarded.
pub struct Held {
    conn: Option<Box<dyn LockConn>>,
    id: String,
}

impl Held {
    /// Best-effort release; errors are logged and discarded, never
    /// propagated — teardown must not fail because unlock failed.
    pub async fn release(mut self) {
        if let Some(mut conn) = self.conn.take() {
            if let Err(e) = conn.release(&self.id).await {
                tracing::warn!("lock release failed (ignored): {e}");
            }
        }
    }
}

/// Acquire the migration lock per the behaviour table above. `database` and
/// `schema` feed the lock-id derivation; `no_lock` and the adapter's
/// `supports_locking()` select the branch.
pub async fn acquire(
    adapter: &dyn Adapter,
    backend: &dyn Backend,
    database: &str,
    schema: Option<&str>,
    no_lock: bool,
    poll_interval: Duration,
    cancel: &CancellationToken,
    notify: &dyn Notify,
) -> Result<Option<Held>> {
    match (no_lock, adapter.supports_locking()) {
        (true, true) => {
            notify.message("running without locking");
            Ok(None)
        }
        (true, false) => Ok(None),
        (false, false) => Err(EngineError::LockingNotSupported(adapter.name().to_string())),
        (false, true) => {
            let id = lock_id(database, schema, crate::adapter::DBMIGRATE_VERSIONS_TABLE);
            let mut conn = backend.lock_connection().await?;

            loop {
                if cancel.is_cancelled() {
                    return Err(EngineError::Cancelled);
                }
                if conn
                    .try_acquire(&id)
                    .await
                    .map_err(|e| EngineError::LockAcquire(e.to_string()))?
                {
                    break;
                }
                notify.message("Waiting for migration lock...");
                tokio::select! {
                    _ = tokio::time::sleep(poll_interval) => {}
                    _ = cancel.cancelled() => return Err(EngineError::Cancelled),
                }
            }

            Ok(Some(Held { conn: Some(conn), id }))
        }
    }
}

/// Test double used when a real network-locking backend isn't available:
/// an in-process lock keyed by id, useful for exercising the acquire/poll
/// loop and concurrent-contention scenarios without a live Postgres/MySQL.
#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct InProcessLocks {
        held: Mutex<HashSet<String>>,
    }

    pub struct InProcessLockConn {
        pub locks: Arc<InProcessLocks>,
        pub held_id: Option<String>,
    }

    #[async_trait]
    impl LockConn for InProcessLockConn {
        async fn try_acquire(&mut self, lock_id: &str) -> Result<bool> {
            let mut held = self.locks.held.lock().unwrap();
            if held.contains(lock_id) {
                Ok(false)
            } else {
                held.insert(lock_id.to_string());
                self.held_id = Some(lock_id.to_string());
                Ok(true)
            }
        }

        async fn release(&mut self, lock_id: &str) -> Result<()> {
            self.locks.held.lock().unwrap().remove(lock_id);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_support::{InProcessLockConn, InProcessLocks};

    #[tokio::test]
    async fn in_process_lock_serialises_two_contenders() {
        let locks = Arc::new(InProcessLocks::default());
        let mut a = InProcessLockConn {
            locks: locks.clone(),
            held_id: None,
        };
        let mut b = InProcessLockConn {
            locks: locks.clone(),
            held_id: None,
        };

        assert!(a.try_acquire("lock-1").await.unwrap());
        assert!(!b.try_acquire("lock-1").await.unwrap());

        a.release("lock-1").await.unwrap();
        assert!(b.try_acquire("lock-1").await.unwrap());
    }

    #[test]
    fn lock_id_is_deterministic() {
        let a = lock_id("appdb", None, "dbmigrate_versions");
        let b = lock_id("appdb", None, "dbmigrate_versions");
        assert_eq!(a, b);
    }

    #[test]
    fn lock_id_distinguishes_database_and_schema() {
        let a = lock_id("appdb", None, "dbmigrate_versions");
        let b = lock_id("otherdb", None, "dbmigrate_versions");
        let c = lock_id("appdb", Some("tenant1"), "dbmigrate_versions");
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn lock_id_is_a_plain_decimal_crc32() {
        let id = lock_id("appdb", None, "dbmigrate_versions");
        assert!(id.chars().all(|c| c.is_ascii_digit()));
        let value: u64 = id.parse().unwrap();
        assert!(value <= u32::MAX as u64);
    }
}
