//! The engine handle and the up/down state machine.

use crate::adapter::{lookup, Adapter, Backend};
use crate::catalogue::Catalogue;
use crate::content::ContentSource;
use crate::error::{EngineError, Result};
use crate::lock;
use crate::mode::TxnMode;
use crate::notify::Notify;
use crate::runner;
use crate::url;
use crate::versions::VersionsStore;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Options threaded through every engine invocation. The overall deadline
/// is the caller's responsibility: drive `cancel` from
/// `EngineConfig::deadline()` with a `tokio::time::sleep` + cancel, as the
/// CLI front end does. `cancel` is honoured both while waiting on the
/// migration lock and for every SQL call made during execution, so a hung
/// migration can still be interrupted once the lock is held.

pub struct RunOptions<'a> {
    pub mode: TxnMode,
    pub no_lock: bool,
    pub schema: Option<&'a str>,
    /// How often to retry `try_acquire` while waiting on a held lock.
    /// Callers without an `EngineConfig` can use `lock::DEFAULT_POLL_INTERVAL`.
    pub lock_poll_interval: Duration,
    pub cancel: CancellationToken,
    pub notify: &'a dyn Notify,
}

/// The engine handle: an open connection/pool, the frozen catalogue, the
/// bound driver and database names, and the adapter record.
///
/// Constructed per invocation; [`Engine::up`]/[`Engine::down`] each run the
/// full `idle → lock-held → versions-loaded → validated → executing →
/// finalised` state machine and tear down (lock release) on every exit path.
#[derive(Clone)]
pub struct Engine {
    adapter: Arc<dyn Adapter>,
    backend: Arc<dyn Backend>,
    catalogue: Catalogue,
    database: String,
}

impl Engine {
    /// Resolves the driver (explicit or inferred from `url`), looks it up in
    /// the registry, opens its connection pool, and freezes a catalogue
    /// discovered from `migrations_dir`.
    pub async fn connect(
        explicit_driver: Option<&str>,
        url_str: &str,
        migrations_dir: &std::path::Path,
    ) -> Result<Self> {
        let (driver, url_str) = url::sanitise(explicit_driver, url_str)?;
        let adapter = lookup(&driver).ok_or_else(|| EngineError::UnknownDriver(driver.clone()))?;
        let backend = adapter.connect(&url_str).await?;
        let catalogue = Catalogue::discover(migrations_dir)
            .map_err(|e| EngineError::Connection(e.to_string()))?;
        let database = database_name_from_url(&url_str);

        Ok(Self {
            adapter,
            backend,
            catalogue,
            database,
        })
    }

    /// Construct directly from an already-open backend and a pre-built
    /// catalogue — the path used by tests and by callers embedding
    /// migrations in memory.
    pub fn from_parts(
        adapter: Arc<dyn Adapter>,
        backend: Arc<dyn Backend>,
        catalogue: Catalogue,
        database: impl Into<String>,
    ) -> Self {
        Self {
            adapter,
            backend,
            catalogue,
            database: database.into(),
        }
    }

    pub fn driver_name(&self) -> &'static str {
        self.adapter.name()
    }

    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    /// Reads the bookkeeping table without acquiring the lock or running any
    /// migrations, for read-only status reporting.
    pub async fn load_versions(&self, schema: Option<&str>) -> Result<VersionsStore> {
        VersionsStore::load(self.adapter.as_ref(), self.backend.as_ref(), schema).await
    }

    /// Applies every pending up-migration, in ascending order.
    pub async fn up(&self, content: &dyn ContentSource, opts: &RunOptions<'_>) -> Result<()> {
        let held = lock::acquire(
            self.adapter.as_ref(),
            self.backend.as_ref(),
            &self.database,
            opts.schema,
            opts.no_lock,
            opts.lock_poll_interval,
            &opts.cancel,
            opts.notify,
        )
        .await?;

        let result = self.up_locked(content, opts).await;

        if let Some(held) = held {
            held.release().await;
        }
        result
    }

    async fn up_locked(&self, content: &dyn ContentSource, opts: &RunOptions<'_>) -> Result<()> {
        self.maybe_emit_mysql_ddl_advisory(opts.notify);

        let versions = VersionsStore::load(self.adapter.as_ref(), self.backend.as_ref(), opts.schema)
            .await?;
        let files = runner::pending_up(&self.catalogue, &versions);

        runner::validate_mode_compat(opts.mode, &files)?;

        runner::execute(
            self.adapter.as_ref(),
            self.backend.as_ref(),
            opts.schema,
            content,
            &files,
            opts.mode,
            true,
            opts.notify,
            &opts.cancel,
        )
        .await
    }

    /// Rolls back up to `n` of the most recently applied migrations,
    /// descending.
    pub async fn down(&self, content: &dyn ContentSource, n: usize, opts: &RunOptions<'_>) -> Result<()> {
        let held = lock::acquire(
            self.adapter.as_ref(),
            self.backend.as_ref(),
            &self.database,
            opts.schema,
            opts.no_lock,
            opts.lock_poll_interval,
            &opts.cancel,
            opts.notify,
        )
        .await?;

        let result = self.down_locked(content, n, opts).await;

        if let Some(held) = held {
            held.release().await;
        }
        result
    }

    async fn down_locked(
        &self,
        content: &dyn ContentSource,
        n: usize,
        opts: &RunOptions<'_>,
    ) -> Result<()> {
        self.maybe_emit_mysql_ddl_advisory(opts.notify);

        let versions = VersionsStore::load(self.adapter.as_ref(), self.backend.as_ref(), opts.schema)
            .await?;
        let files = runner::pending_down(&self.catalogue, &versions, n);

        runner::validate_mode_compat(opts.mode, &files)?;

        runner::execute(
            self.adapter.as_ref(),
            self.backend.as_ref(),
            opts.schema,
            content,
            &files,
            opts.mode,
            false,
            opts.notify,
            &opts.cancel,
        )
        .await
    }

    /// Three-line advisory emitted only for the `mysql` driver, after lock
    /// acquisition and before execution. Informational; never aborts.
    fn maybe_emit_mysql_ddl_advisory(&self, notify: &dyn Notify) {
        if self.adapter.name() == crate::adapter::DRIVER_MYSQL {
            notify.message("MySQL implicitly commits DDL statements.");
            notify.message("Transaction modes 'all' and 'per-file' do not roll back schema changes on this driver.");
            notify.message("Consider mode 'none' if this surprises you.");
        }
    }
}

fn database_name_from_url(url_str: &str) -> String {
    url::rewrite_database(url_str, "")
        .map(|(_, db)| db)
        .unwrap_or_default()
}
