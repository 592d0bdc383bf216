//! Migration runner: reconciliation, mode-compatibility validation, and the
//! three execution strategies.

use crate::adapter::{Adapter, Backend, Tx};
use crate::catalogue::{Catalogue, MigrationFile};
use crate::content::{is_whitespace_only, ContentSource};
use crate::error::{EngineError, Result};
use crate::mode::TxnMode;
use crate::notify::Notify;
use crate::versions::VersionsStore;
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Files whose up-version is in the catalogue but not yet applied,
/// ascending.
pub fn pending_up<'a>(catalogue: &'a Catalogue, versions: &VersionsStore) -> Vec<&'a MigrationFile> {
    catalogue
        .ascending_up()
        .into_iter()
        .filter(|f| !versions.contains(&f.version))
        .collect()
}

/// Up to `n` applied files to roll back, descending; `n == 0` yields
/// nothing, `n` larger than the applied count yields everything
/// applicable.
pub fn pending_down<'a>(
    catalogue: &'a Catalogue,
    versions: &VersionsStore,
    n: usize,
) -> Vec<&'a MigrationFile> {
    if n == 0 {
        return Vec::new();
    }
    let mut out = Vec::new();
    for f in catalogue.descending_down() {
        if !versions.contains(&f.version) {
            continue;
        }
        out.push(f);
        if out.len() >= n {
            break;
        }
    }
    out
}

/// Rejects mode `all` when any selected file is non-transactional.
pub fn validate_mode_compat(mode: TxnMode, files: &[&MigrationFile]) -> Result<()> {
    if mode != TxnMode::All {
        return Ok(());
    }
    let offenders: Vec<String> = files
        .iter()
        .filter(|f| !f.transactional)
        .map(|f| f.filename.clone())
        .collect();
    if offenders.is_empty() {
        Ok(())
    } else {
        Err(EngineError::TxnModeConflict {
            files: offenders,
            mode: mode.to_string(),
        })
    }
}

fn with_partial_count(e: EngineError, applied: usize) -> EngineError {
    match e {
        EngineError::Execution { file, source } => EngineError::Execution {
            file,
            source: anyhow::anyhow!("{source} ({applied} migrations applied before failure.)"),
        },
        EngineError::RegisterVersion { version, source } => EngineError::RegisterVersion {
            version,
            source: anyhow::anyhow!("{source} ({applied} migrations applied before failure.)"),
        },
        EngineError::UnregisterVersion { version, source } => EngineError::UnregisterVersion {
            version,
            source: anyhow::anyhow!("{source} ({applied} migrations applied before failure.)"),
        },
        other => other,
    }
}

fn read_file(content: &dyn ContentSource, file: &MigrationFile) -> Result<Vec<u8>> {
    content.read(&file.filename).map_err(|e| EngineError::Execution {
        file: file.filename.clone(),
        source: e.into(),
    })
}

/// Races `fut` against `cancel`, so a hung or slow blocking call never
/// outlives the caller's deadline once the lock has been acquired.
async fn cancellable<T>(cancel: &CancellationToken, fut: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::select! {
        result = fut => result,
        _ = cancel.cancelled() => Err(EngineError::Cancelled),
    }
}

async fn apply_via_backend(
    backend: &dyn Backend,
    content: &dyn ContentSource,
    file: &MigrationFile,
    bookkeeping_sql: &str,
    register: bool,
    cancel: &CancellationToken,
) -> Result<()> {
    let bytes = read_file(content, file)?;
    if !is_whitespace_only(&bytes) {
        let sql = String::from_utf8_lossy(&bytes).into_owned();
        cancellable(cancel, async {
            backend.execute(&sql).await.map_err(|e| EngineError::Execution {
                file: file.filename.clone(),
                source: anyhow::anyhow!(e.to_string()),
            })
        })
        .await?;
    }
    if register {
        cancellable(cancel, backend.insert_version(bookkeeping_sql, &file.version)).await
    } else {
        cancellable(cancel, backend.delete_version(bookkeeping_sql, &file.version)).await
    }
}

async fn apply_via_tx(
    tx: &mut dyn Tx,
    content: &dyn ContentSource,
    file: &MigrationFile,
    bookkeeping_sql: &str,
    register: bool,
    cancel: &CancellationToken,
) -> Result<()> {
    let bytes = read_file(content, file)?;
    if !is_whitespace_only(&bytes) {
        let sql = String::from_utf8_lossy(&bytes).into_owned();
        cancellable(cancel, async {
            tx.execute(&sql).await.map_err(|e| EngineError::Execution {
                file: file.filename.clone(),
                source: anyhow::anyhow!(e.to_string()),
            })
        })
        .await?;
    }
    if register {
        cancellable(cancel, tx.insert_version(bookkeeping_sql, &file.version)).await
    } else {
        cancellable(cancel, tx.delete_version(bookkeeping_sql, &file.version)).await
    }
}

/// Runs `files` forward (up) or backward (down) under `mode`.
///
/// `files` must already be in the correct order (ascending for up,
/// descending for down — see [`pending_up`]/[`pending_down`]); this
/// function does not re-sort. Every blocking call onto `backend`/`tx` is
/// raced against `cancel` so a caller-configured deadline can interrupt a
/// hung migration statement even after the migration lock is already held.
pub async fn execute(
    adapter: &dyn Adapter,
    backend: &dyn Backend,
    schema: Option<&str>,
    content: &dyn ContentSource,
    files: &[&MigrationFile],
    mode: TxnMode,
    register: bool,
    notify: &dyn Notify,
    cancel: &CancellationToken,
) -> Result<()> {
    validate_mode_compat(mode, files)?;

    let bookkeeping_sql = if register {
        adapter.insert_new_version_sql(schema)
    } else {
        adapter.delete_old_version_sql(schema)
    };

    match mode {
        TxnMode::All => {
            let mut tx = cancellable(cancel, backend.begin()).await?;
            for file in files {
                if let Err(e) =
                    apply_via_tx(&mut *tx, content, file, &bookkeeping_sql, register, cancel).await
                {
                    let _ = tx.rollback().await;
                    return Err(e);
                }
                notify.message(&format!("{} applied", file.filename));
            }
            cancellable(cancel, tx.commit()).await?;
            Ok(())
        }
        TxnMode::PerFile => {
            let mut applied = 0usize;
            for file in files {
                let result = if file.transactional {
                    let mut tx = cancellable(cancel, backend.begin()).await?;
                    match apply_via_tx(&mut *tx, content, file, &bookkeeping_sql, register, cancel).await
                    {
                        Ok(()) => cancellable(cancel, tx.commit()).await,
                        Err(e) => {
                            let _ = tx.rollback().await;
                            Err(e)
                        }
                    }
                } else {
                    apply_via_backend(backend, content, file, &bookkeeping_sql, register, cancel).await
                };

                match result {
                    Ok(()) => {
                        applied += 1;
                        notify.message(&format!("{} applied", file.filename));
                    }
                    Err(e) => {
                        notify.message(&format!("{applied} migrations applied before failure."));
                        return Err(with_partial_count(e, applied));
                    }
                }
            }
            Ok(())
        }
        TxnMode::None => {
            let mut applied = 0usize;
            for file in files {
                match apply_via_backend(backend, content, file, &bookkeeping_sql, register, cancel).await
                {
                    Ok(()) => {
                        applied += 1;
                        notify.message(&format!("{} applied", file.filename));
                    }
                    Err(e) => {
                        notify.message(&format!("{applied} migrations applied before failure."));
                        return Err(with_partial_count(e, applied));
                    }
                }
            }
            Ok(())
        }
    }
}
