//! Structured error taxonomy for the migration engine.
//!
//! Library code returns [`EngineError`] so callers can match on a specific
//! failure mode (capability mismatch, mode conflict, ...) instead of parsing
//! a message string. The CLI front end flattens everything into
//! `anyhow::Error` at the outer boundary, same split the rest of this repo
//! uses between library and binary.

use thiserror::Error;

/// Every error the engine can surface to a caller.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no database URL provided")]
    MissingUrl,

    #[error(
        "could not infer a driver from this URL; pass --driver explicitly \
         (DSN forms without a `scheme://` prefix are not guessable)"
    )]
    DriverRequired,

    #[error("unknown driver '{0}'; known drivers: postgres, mysql, sqlite3, cql")]
    UnknownDriver(String),

    #[error("invalid transaction mode '{0}'; valid values are: all, per-file, none")]
    InvalidMode(String),

    #[error("unknown schema '{0}'")]
    UnknownSchema(String),

    #[error(
        "driver '{0}' does not support advisory locking; rerun with --no-lock to proceed \
         without cross-process coordination, understanding that concurrent invocations \
         may race"
    )]
    LockingNotSupported(String),

    #[error("driver '{0}' does not support database creation")]
    CreateDbNotSupported(String),

    #[error("driver '{0}' does not support readiness polling")]
    ServerReadyNotSupported(String),

    #[error("driver '{0}' does not support schema creation")]
    SchemaNotSupported(String),

    #[error(
        "the following files are not transactional (.no-db-txn.) and cannot run in \
         --mode={mode}; rerun with --mode=per-file instead:\n{}",
        .files.join("\n")
    )]
    TxnModeConflict { files: Vec<String>, mode: String },

    #[error("failed to connect to database: {0}")]
    Connection(String),

    #[error("failed to acquire migration lock: {0}")]
    LockAcquire(String),

    #[error("release of migration lock failed (ignored): {0}")]
    LockRelease(String),

    #[error("migration {file} failed: {source}")]
    Execution {
        file: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to register version {version}: {source}")]
    RegisterVersion {
        version: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to unregister version {version}: {source}")]
    UnregisterVersion {
        version: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("could not load applied versions: {0}")]
    VersionsLoad(anyhow::Error),

    #[error("operation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, EngineError>;
