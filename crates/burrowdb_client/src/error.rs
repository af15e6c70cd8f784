//! Error taxonomy of the adapter: one type per operation family.
//!
//! Each type wraps the engine's failure verbatim — the adapter performs no
//! recovery or retries; callers decide whether to retry, log, or stop.

use burrowdb_engine::EngineError;
use thiserror::Error;

/// Opening a database (or running its upgrade) failed.
#[derive(Debug, Error)]
#[error("failed to open database {database}")]
pub struct ConnectionError {
    /// Database the open was for.
    pub database: String,
    /// Underlying engine failure.
    #[source]
    pub source: EngineError,
}

/// A write did not reach commit; its transaction was aborted.
#[derive(Debug, Error)]
#[error("failed to write record to store {store}")]
pub struct WriteError {
    /// Store the write targeted.
    pub store: String,
    /// Underlying engine failure.
    #[source]
    pub source: EngineError,
}

/// A point read failed at the engine level.
///
/// A missing record is not a `ReadError`: absent keys resolve to
/// `Ok(None)`.
#[derive(Debug, Error)]
#[error("failed to read record from store {store}")]
pub struct ReadError {
    /// Store the read targeted.
    pub store: String,
    /// Underlying engine failure.
    #[source]
    pub source: EngineError,
}

/// A cursor scan failed mid-iteration; partial results were discarded.
#[derive(Debug, Error)]
#[error("failed to scan store {store}")]
pub struct ScanError {
    /// Store the scan targeted.
    pub store: String,
    /// Underlying engine failure.
    #[source]
    pub source: EngineError,
}

impl ConnectionError {
    pub(crate) fn new(database: impl Into<String>, source: EngineError) -> Self {
        Self {
            database: database.into(),
            source,
        }
    }
}

impl WriteError {
    pub(crate) fn new(store: impl Into<String>, source: EngineError) -> Self {
        Self {
            store: store.into(),
            source,
        }
    }
}

impl ReadError {
    pub(crate) fn new(store: impl Into<String>, source: EngineError) -> Self {
        Self {
            store: store.into(),
            source,
        }
    }
}

impl ScanError {
    pub(crate) fn new(store: impl Into<String>, source: EngineError) -> Self {
        Self {
            store: store.into(),
            source,
        }
    }
}
