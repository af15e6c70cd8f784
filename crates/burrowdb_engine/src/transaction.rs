//! Transactions: mode-tagged units of work with buffered writes, and the
//! lock table serializing read-write transactions.

use crate::error::{EngineError, EngineResult};
use crate::key::Key;
use crate::store::StoreSnapshot;
use crate::types::TransactionId;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

/// Buffered puts of one transaction: store -> primary key -> record.
pub(crate) type WriteSet = BTreeMap<String, BTreeMap<Key, Arc<Value>>>;

/// Access mode of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionMode {
    /// Reads only; never waits, sees a snapshot taken at begin.
    ReadOnly,
    /// Reads and writes; holds exclusive locks on its store scope.
    ReadWrite,
}

/// Lifecycle state of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TransactionState {
    /// Operations may be issued.
    Active,
    /// Commit applied; the transaction is finished.
    Committed,
    /// Writes discarded; the transaction is finished.
    Aborted,
}

/// An active transaction.
///
/// Writes buffer in the transaction and apply atomically at commit. Reads
/// go through the begin-time snapshot, overlaid with the transaction's own
/// buffered writes.
#[derive(Debug)]
pub(crate) struct Transaction {
    id: TransactionId,
    /// Database the transaction belongs to.
    pub(crate) database: String,
    mode: TransactionMode,
    state: TransactionState,
    /// Declared store scope.
    scope: HashSet<String>,
    /// Begin-time snapshot per store in scope.
    snapshots: HashMap<String, StoreSnapshot>,
    /// Buffered puts. A later put to the same key replaces the earlier
    /// buffered one.
    writes: WriteSet,
}

impl Transaction {
    pub(crate) fn new(
        id: TransactionId,
        database: String,
        mode: TransactionMode,
        snapshots: HashMap<String, StoreSnapshot>,
    ) -> Self {
        Self {
            id,
            database,
            mode,
            state: TransactionState::Active,
            scope: snapshots.keys().cloned().collect(),
            snapshots,
            writes: BTreeMap::new(),
        }
    }

    pub(crate) fn id(&self) -> TransactionId {
        self.id
    }

    pub(crate) fn mode(&self) -> TransactionMode {
        self.mode
    }

    pub(crate) fn is_active(&self) -> bool {
        self.state == TransactionState::Active
    }

    /// Returns the snapshot for a store, or `StoreNotInScope`.
    pub(crate) fn snapshot(&self, store: &str) -> EngineResult<&StoreSnapshot> {
        self.snapshots
            .get(store)
            .ok_or_else(|| EngineError::store_not_in_scope(store))
    }

    /// Buffers a put. The caller has already extracted and validated the
    /// primary key.
    pub(crate) fn buffer_put(
        &mut self,
        store: &str,
        primary: Key,
        record: Arc<Value>,
    ) -> EngineResult<()> {
        self.ensure_active()?;
        if self.mode != TransactionMode::ReadWrite {
            return Err(EngineError::ReadOnlyTransaction);
        }
        if !self.scope.contains(store) {
            return Err(EngineError::store_not_in_scope(store));
        }
        self.writes
            .entry(store.to_string())
            .or_default()
            .insert(primary, record);
        Ok(())
    }

    /// Reads a key as this transaction sees it: buffered writes first, then
    /// the begin-time snapshot.
    pub(crate) fn read(&self, store: &str, key: &Key) -> EngineResult<Option<Arc<Value>>> {
        self.ensure_active()?;
        if let Some(buffered) = self.writes.get(store).and_then(|b| b.get(key)) {
            return Ok(Some(Arc::clone(buffered)));
        }
        Ok(self.snapshot(store)?.get(key))
    }

    /// Takes the buffered writes for commit, leaving the buffer empty.
    pub(crate) fn take_writes(&mut self) -> WriteSet {
        std::mem::take(&mut self.writes)
    }

    pub(crate) fn mark_committed(&mut self) {
        self.state = TransactionState::Committed;
    }

    pub(crate) fn mark_aborted(&mut self) {
        self.state = TransactionState::Aborted;
    }

    fn ensure_active(&self) -> EngineResult<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(EngineError::TransactionClosed)
        }
    }
}

/// Exclusive locks held by read-write transactions, keyed by
/// (database, store).
///
/// Acquisition is all-or-nothing: a begin either locks its whole scope or
/// waits, so overlapping read-write transactions cannot deadlock.
#[derive(Debug, Default)]
pub(crate) struct LockTable {
    held: HashMap<(String, String), TransactionId>,
}

impl LockTable {
    /// Returns true if every (database, store) pair is unlocked.
    pub(crate) fn available(
        &self,
        database: &str,
        stores: impl IntoIterator<Item = impl AsRef<str>>,
    ) -> bool {
        stores.into_iter().all(|store| {
            !self
                .held
                .contains_key(&(database.to_string(), store.as_ref().to_string()))
        })
    }

    /// Locks the whole scope for a transaction. Call only after
    /// [`LockTable::available`] said yes.
    pub(crate) fn acquire(
        &mut self,
        database: &str,
        stores: impl IntoIterator<Item = impl AsRef<str>>,
        owner: TransactionId,
    ) {
        for store in stores {
            self.held
                .insert((database.to_string(), store.as_ref().to_string()), owner);
        }
    }

    /// Releases every lock held by a transaction.
    pub(crate) fn release(&mut self, owner: TransactionId) {
        self.held.retain(|_, holder| *holder != owner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn txn(mode: TransactionMode) -> Transaction {
        use crate::schema::StoreSpec;
        use crate::store::ObjectStore;

        let store = ObjectStore::new(&StoreSpec::new("blog", "title"));
        let mut snapshots = HashMap::new();
        snapshots.insert("blog".to_string(), store.snapshot());
        Transaction::new(TransactionId::new(1), "db".into(), mode, snapshots)
    }

    #[test]
    fn read_only_transaction_rejects_puts() {
        let mut t = txn(TransactionMode::ReadOnly);
        let result = t.buffer_put("blog", Key::from("T1"), Arc::new(json!({"title": "T1"})));
        assert_eq!(result, Err(EngineError::ReadOnlyTransaction));
    }

    #[test]
    fn buffered_writes_are_visible_to_own_reads() {
        let mut t = txn(TransactionMode::ReadWrite);
        let record = Arc::new(json!({"title": "T1", "author": "j"}));
        t.buffer_put("blog", Key::from("T1"), Arc::clone(&record))
            .unwrap();
        assert_eq!(t.read("blog", &Key::from("T1")).unwrap(), Some(record));
    }

    #[test]
    fn closed_transaction_rejects_operations() {
        let mut t = txn(TransactionMode::ReadWrite);
        t.mark_aborted();
        assert_eq!(
            t.read("blog", &Key::from("T1")),
            Err(EngineError::TransactionClosed)
        );
    }

    #[test]
    fn out_of_scope_store_is_rejected() {
        let mut t = txn(TransactionMode::ReadWrite);
        let result = t.buffer_put("other", Key::from("k"), Arc::new(json!({})));
        assert_eq!(
            result,
            Err(EngineError::store_not_in_scope("other"))
        );
    }

    #[test]
    fn lock_table_is_all_or_nothing_per_scope() {
        let mut locks = LockTable::default();
        let a = TransactionId::new(1);
        let b = TransactionId::new(2);

        assert!(locks.available("db", ["blog", "users"]));
        locks.acquire("db", ["blog"], a);
        assert!(!locks.available("db", ["blog", "users"]));
        // A different database is an independent namespace.
        assert!(locks.available("other", ["blog"]));

        locks.acquire("db", ["users"], b);
        locks.release(a);
        assert!(locks.available("db", ["blog"]));
        assert!(!locks.available("db", ["users"]));
    }
}
