//! Query helpers: point write, point read, range scan, and index scan.
//!
//! Each helper owns a whole transaction: begin, the operation(s), commit.
//! Failures abort the transaction before the error propagates, so no
//! helper ever leaks a live transaction into the engine.

use crate::connection::Connection;
use crate::cursor::drain_cursor;
use crate::error::{ReadError, ScanError, WriteError};
use crate::resolver::await_engine;
use burrowdb_engine::{
    Completion, CursorId, EngineResult, Key, KeyRange, Record, TransactionId, TransactionMode,
};
use tracing::debug;

impl Connection {
    /// Writes a record into `store` ("put" semantics: an existing record
    /// under the same primary key is replaced).
    ///
    /// # Errors
    ///
    /// [`WriteError`] if the put or the commit fails; the transaction is
    /// aborted before the error is returned. No retries are attempted.
    pub async fn write_record(&self, store: &str, record: Record) -> Result<(), WriteError> {
        let wrap = |source| WriteError::new(store, source);
        let txn = self
            .begin(store, TransactionMode::ReadWrite)
            .await
            .map_err(wrap)?;

        let put = await_engine(|done| self.engine.put(txn, store, record, done)).await;
        if let Err(source) = put {
            self.abort_quietly(txn).await;
            return Err(wrap(source));
        }

        // A failed commit (e.g. a unique-index violation) has already been
        // aborted by the engine; there is nothing left to roll back here.
        await_engine(|done| self.engine.commit(txn, done))
            .await
            .map_err(wrap)
    }

    /// Reads the record stored under `key`, or `None` if there is none.
    ///
    /// An absent key is a normal outcome, not a failure.
    ///
    /// # Errors
    ///
    /// [`ReadError`] on engine-level failure (e.g. the transaction could
    /// not be created).
    pub async fn read_record(&self, store: &str, key: Key) -> Result<Option<Record>, ReadError> {
        let wrap = |source| ReadError::new(store, source);
        let txn = self
            .begin(store, TransactionMode::ReadOnly)
            .await
            .map_err(wrap)?;

        match await_engine(|done| self.engine.get(txn, store, key, done)).await {
            Ok(found) => {
                self.finish_read(txn).await;
                Ok(found.map(|record| record.as_ref().clone()))
            }
            Err(source) => {
                self.abort_quietly(txn).await;
                Err(wrap(source))
            }
        }
    }

    /// Returns every record whose primary key is >= `lower_bound`, in
    /// ascending primary-key order.
    ///
    /// The scan materializes the whole range before returning.
    ///
    /// # Errors
    ///
    /// [`ScanError`] on a cursor or transaction failure mid-scan; partial
    /// results are discarded.
    pub async fn scan_range(
        &self,
        store: &str,
        lower_bound: impl Into<Key>,
    ) -> Result<Vec<Record>, ScanError> {
        let range = KeyRange::lower_bound(lower_bound);
        self.scan(store, |txn, done| {
            self.engine.open_cursor(txn, store, range, done)
        })
        .await
    }

    /// Returns every record matching `query` on the named index, in
    /// ascending index-key order (equal keys tie-break in primary-key
    /// order, per the engine's documented ordering).
    ///
    /// `query` is a single equality key or any bounded/unbounded
    /// [`KeyRange`], passed through to the engine verbatim.
    ///
    /// # Errors
    ///
    /// [`ScanError`], as for [`Connection::scan_range`].
    pub async fn scan_index(
        &self,
        store: &str,
        index: &str,
        query: impl Into<KeyRange>,
    ) -> Result<Vec<Record>, ScanError> {
        let range = query.into();
        self.scan(store, |txn, done| {
            self.engine.open_index_cursor(txn, store, index, range, done)
        })
        .await
    }

    /// Shared scan shape: read-only transaction, open a cursor, drain it,
    /// release the transaction.
    async fn scan<F>(&self, store: &str, open: F) -> Result<Vec<Record>, ScanError>
    where
        F: FnOnce(TransactionId, Completion<CursorId>),
    {
        let wrap = |source| ScanError::new(store, source);
        let txn = self
            .begin(store, TransactionMode::ReadOnly)
            .await
            .map_err(wrap)?;

        let records = async {
            let cursor = await_engine(|done| open(txn, done)).await?;
            drain_cursor(&self.engine, cursor).await
        }
        .await;

        match records {
            Ok(records) => {
                self.finish_read(txn).await;
                debug!(store = %store, count = records.len(), "scan complete");
                Ok(records)
            }
            Err(source) => {
                self.abort_quietly(txn).await;
                Err(wrap(source))
            }
        }
    }

    async fn begin(&self, store: &str, mode: TransactionMode) -> EngineResult<TransactionId> {
        await_engine(|done| self.engine.begin(&self.database, &[store], mode, done)).await
    }

    /// Releases a read-only transaction. Read commits cannot carry a data
    /// failure; a failure here means the engine went away, which the next
    /// operation will surface anyway.
    async fn finish_read(&self, txn: TransactionId) {
        if let Err(error) = await_engine(|done| self.engine.commit(txn, done)).await {
            debug!(%txn, %error, "releasing read transaction failed");
        }
    }

    /// Best-effort abort after a failed operation; the original error is
    /// the one the caller sees.
    async fn abort_quietly(&self, txn: TransactionId) {
        if let Err(error) = await_engine(|done| self.engine.abort(txn, done)).await {
            debug!(%txn, %error, "abort after failed operation also failed");
        }
    }
}
