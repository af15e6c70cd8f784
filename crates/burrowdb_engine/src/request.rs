//! The request surface: messages submitted to the engine worker.

use crate::cursor::CursorEntry;
use crate::database::UpgradeContext;
use crate::error::{EngineError, EngineResult};
use crate::key::{Key, KeyRange};
use crate::transaction::TransactionMode;
use crate::types::{CursorId, TransactionId};
use serde_json::Value;
use std::sync::Arc;

/// One-shot completion callback for a request.
///
/// Invoked exactly once, on the engine worker thread, with the request's
/// terminal result. Cursor requests complete once per step.
pub type Completion<T> = Box<dyn FnOnce(EngineResult<T>) + Send + 'static>;

/// Version-change upgrade callback.
///
/// Run at most once per open, before the open completes, and only when the
/// database is new or the requested version exceeds the stored one. An
/// error aborts the upgrade: the database keeps its previous schema and
/// version, and the open fails with the returned error.
pub type UpgradeFn = Box<dyn FnOnce(&mut UpgradeContext<'_>) -> EngineResult<()> + Send + 'static>;

/// A request message consumed by the engine worker.
pub(crate) enum Request {
    /// Open (or create) a database, running the upgrade callback if the
    /// version increases. Completes with the resolved version.
    OpenDatabase {
        name: String,
        version: Option<u64>,
        upgrade: UpgradeFn,
        done: Completion<u64>,
    },
    /// Begin a transaction over a store scope.
    Begin {
        database: String,
        stores: Vec<String>,
        mode: TransactionMode,
        done: Completion<TransactionId>,
    },
    /// Insert or overwrite a record ("put" semantics). Completes with the
    /// record's primary key.
    Put {
        txn: TransactionId,
        store: String,
        record: Value,
        done: Completion<Key>,
    },
    /// Point lookup by primary key. An absent key completes with `None`.
    Get {
        txn: TransactionId,
        store: String,
        key: Key,
        done: Completion<Option<Arc<Value>>>,
    },
    /// Open a cursor over the store's primary-key ordering.
    OpenCursor {
        txn: TransactionId,
        store: String,
        range: KeyRange,
        done: Completion<CursorId>,
    },
    /// Open a cursor over a named index ordering.
    OpenIndexCursor {
        txn: TransactionId,
        store: String,
        index: String,
        range: KeyRange,
        done: Completion<CursorId>,
    },
    /// Advance a cursor one step. Completes with `None` at exhaustion.
    CursorContinue {
        cursor: CursorId,
        done: Completion<Option<CursorEntry>>,
    },
    /// Apply a transaction's buffered writes atomically.
    Commit {
        txn: TransactionId,
        done: Completion<()>,
    },
    /// Discard a transaction's buffered writes.
    Abort {
        txn: TransactionId,
        done: Completion<()>,
    },
    /// Stop the worker. Requests still queued behind this message fail
    /// with `EngineClosed`.
    Shutdown,
}

impl Request {
    /// Completes the request with an error without executing it.
    pub(crate) fn fail(self, error: EngineError) {
        match self {
            Request::OpenDatabase { done, .. } => done(Err(error)),
            Request::Begin { done, .. } => done(Err(error)),
            Request::Put { done, .. } => done(Err(error)),
            Request::Get { done, .. } => done(Err(error)),
            Request::OpenCursor { done, .. } => done(Err(error)),
            Request::OpenIndexCursor { done, .. } => done(Err(error)),
            Request::CursorContinue { done, .. } => done(Err(error)),
            Request::Commit { done, .. } => done(Err(error)),
            Request::Abort { done, .. } => done(Err(error)),
            Request::Shutdown => {}
        }
    }
}
