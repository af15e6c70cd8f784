//! Object store state: committed records and their secondary indexes.

use crate::error::{EngineError, EngineResult};
use crate::key::Key;
use crate::schema::{IndexSpec, StoreSpec};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// One secondary index over a store.
///
/// Entries map an index key to the set of primary keys of records holding
/// that key. `BTreeSet` gives the documented tie-break: within one index
/// key, records are ordered by primary key.
#[derive(Debug, Clone)]
pub(crate) struct IndexState {
    /// Index definition.
    pub(crate) spec: IndexSpec,
    /// Index key -> primary keys of the records carrying it.
    pub(crate) entries: BTreeMap<Key, BTreeSet<Key>>,
}

impl IndexState {
    fn new(spec: IndexSpec) -> Self {
        Self {
            spec,
            entries: BTreeMap::new(),
        }
    }

    fn insert(&mut self, index_key: Key, primary: Key) {
        self.entries.entry(index_key).or_default().insert(primary);
    }

    fn remove(&mut self, index_key: &Key, primary: &Key) {
        if let Some(set) = self.entries.get_mut(index_key) {
            set.remove(primary);
            if set.is_empty() {
                self.entries.remove(index_key);
            }
        }
    }
}

/// A named collection of records keyed by primary key.
#[derive(Debug, Clone)]
pub(crate) struct ObjectStore {
    /// Store name.
    name: String,
    /// Field path holding each record's primary key.
    key_path: String,
    /// Committed records in primary-key order.
    records: BTreeMap<Key, Arc<Value>>,
    /// Indexes by name.
    indexes: BTreeMap<String, IndexState>,
}

impl ObjectStore {
    /// Creates an empty store from its definition, including its indexes.
    pub(crate) fn new(spec: &StoreSpec) -> Self {
        let mut store = Self {
            name: spec.name.clone(),
            key_path: spec.key_path.clone(),
            records: BTreeMap::new(),
            indexes: BTreeMap::new(),
        };
        for index in &spec.indexes {
            // Fresh store, so the name cannot collide.
            let _ = store.create_index(index.clone());
        }
        store
    }

    /// Adds an index, back-filling it from existing records.
    pub(crate) fn create_index(&mut self, spec: IndexSpec) -> EngineResult<()> {
        if self.indexes.contains_key(&spec.name) {
            return Err(EngineError::invalid_operation(format!(
                "index {} already exists on store {}",
                spec.name, self.name
            )));
        }
        let mut state = IndexState::new(spec);
        for (primary, record) in &self.records {
            if let Some(index_key) = Key::extract_for_index(record, &state.spec.key_path) {
                state.insert(index_key, primary.clone());
            }
        }
        self.indexes.insert(state.spec.name.clone(), state);
        Ok(())
    }

    /// Extracts the primary key a record would be stored under.
    pub(crate) fn primary_key_of(&self, record: &Value) -> EngineResult<Key> {
        Key::extract(record, &self.key_path)
    }

    /// Checks that applying `batch` would not violate a unique index.
    ///
    /// The check considers the committed state with the batch overlaid:
    /// a record being overwritten no longer claims its old index keys, and
    /// two batch records may not claim the same key either.
    pub(crate) fn check_batch(&self, batch: &BTreeMap<Key, Arc<Value>>) -> EngineResult<()> {
        for index in self.indexes.values() {
            if !index.spec.unique {
                continue;
            }
            let mut claimed: BTreeSet<&Key> = BTreeSet::new();
            let mut batch_keys: BTreeMap<Key, &Key> = BTreeMap::new();
            for (primary, record) in batch {
                claimed.insert(primary);
                if let Some(index_key) = Key::extract_for_index(record, &index.spec.key_path) {
                    if batch_keys.insert(index_key, primary).is_some() {
                        return Err(EngineError::unique_violation(&index.spec.name));
                    }
                }
            }
            for (index_key, _) in batch_keys {
                if let Some(holders) = index.entries.get(&index_key) {
                    // Only records that survive the batch still hold the key.
                    if holders.iter().any(|holder| !claimed.contains(holder)) {
                        return Err(EngineError::unique_violation(&index.spec.name));
                    }
                }
            }
        }
        Ok(())
    }

    /// Applies a validated batch of puts: replaces records and maintains
    /// every index.
    pub(crate) fn apply_batch(&mut self, batch: BTreeMap<Key, Arc<Value>>) {
        for (primary, record) in batch {
            if let Some(previous) = self.records.get(&primary) {
                let previous = Arc::clone(previous);
                for index in self.indexes.values_mut() {
                    if let Some(old_key) = Key::extract_for_index(&previous, &index.spec.key_path) {
                        index.remove(&old_key, &primary);
                    }
                }
            }
            for index in self.indexes.values_mut() {
                if let Some(index_key) = Key::extract_for_index(&record, &index.spec.key_path) {
                    index.insert(index_key, primary.clone());
                }
            }
            self.records.insert(primary, record);
        }
    }

    /// Takes a point-in-time copy of the store for a transaction snapshot.
    ///
    /// Record payloads are shared (`Arc`), so the copy is proportional to
    /// the key count, not the payload size.
    pub(crate) fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            records: self.records.clone(),
            indexes: self
                .indexes
                .iter()
                .map(|(name, state)| (name.clone(), state.entries.clone()))
                .collect(),
        }
    }
}

/// Immutable view of a store as of a transaction's begin.
#[derive(Debug, Clone)]
pub(crate) struct StoreSnapshot {
    /// Records in primary-key order.
    pub(crate) records: BTreeMap<Key, Arc<Value>>,
    /// Index entries by index name.
    pub(crate) indexes: BTreeMap<String, BTreeMap<Key, BTreeSet<Key>>>,
}

impl StoreSnapshot {
    /// Point lookup by primary key.
    pub(crate) fn get(&self, key: &Key) -> Option<Arc<Value>> {
        self.records.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn blog_store() -> ObjectStore {
        ObjectStore::new(
            &StoreSpec::new("blog", "title")
                .with_index(IndexSpec::new("AuthorIndex", "author"))
                .with_index(IndexSpec::new("PublishDateIndex", "publishDate")),
        )
    }

    fn put(store: &mut ObjectStore, record: Value) {
        let primary = store.primary_key_of(&record).unwrap();
        let mut batch = BTreeMap::new();
        batch.insert(primary, Arc::new(record));
        store.check_batch(&batch).unwrap();
        store.apply_batch(batch);
    }

    #[test]
    fn put_overwrites_and_reindexes() {
        let mut store = blog_store();
        put(&mut store, json!({"title": "T1", "author": "j"}));
        put(&mut store, json!({"title": "T1", "author": "p"}));

        assert_eq!(store.records.len(), 1);
        let author_index = &store.indexes["AuthorIndex"];
        assert!(!author_index.entries.contains_key(&Key::from("j")));
        assert_eq!(
            author_index.entries[&Key::from("p")],
            BTreeSet::from([Key::from("T1")])
        );
    }

    #[test]
    fn records_without_index_field_are_not_indexed() {
        let mut store = blog_store();
        put(&mut store, json!({"title": "T1"}));
        assert!(store.indexes["AuthorIndex"].entries.is_empty());
        assert_eq!(store.records.len(), 1);
    }

    #[test]
    fn create_index_backfills_existing_records() {
        let mut store = ObjectStore::new(&StoreSpec::new("blog", "title"));
        put(&mut store, json!({"title": "T1", "author": "j"}));
        put(&mut store, json!({"title": "T2", "author": "j"}));

        store
            .create_index(IndexSpec::new("AuthorIndex", "author"))
            .unwrap();
        assert_eq!(
            store.indexes["AuthorIndex"].entries[&Key::from("j")],
            BTreeSet::from([Key::from("T1"), Key::from("T2")])
        );

        let duplicate = store.create_index(IndexSpec::new("AuthorIndex", "author"));
        assert!(matches!(
            duplicate,
            Err(EngineError::InvalidOperation { .. })
        ));
    }

    #[test]
    fn unique_index_rejects_conflicting_batch() {
        let mut store = ObjectStore::new(
            &StoreSpec::new("users", "name").with_index(IndexSpec::unique("EmailIndex", "email")),
        );
        put(&mut store, json!({"name": "a", "email": "x@example.com"}));

        let record = json!({"name": "b", "email": "x@example.com"});
        let mut batch = BTreeMap::new();
        batch.insert(Key::from("b"), Arc::new(record));
        assert_eq!(
            store.check_batch(&batch),
            Err(EngineError::unique_violation("EmailIndex"))
        );

        // Overwriting the holder itself is fine.
        let record = json!({"name": "a", "email": "x@example.com"});
        let mut batch = BTreeMap::new();
        batch.insert(Key::from("a"), Arc::new(record));
        store.check_batch(&batch).unwrap();
    }

    #[test]
    fn snapshot_is_isolated_from_later_writes() {
        let mut store = blog_store();
        put(&mut store, json!({"title": "T1", "author": "j"}));
        let snapshot = store.snapshot();
        put(&mut store, json!({"title": "T2", "author": "p"}));

        assert_eq!(snapshot.records.len(), 1);
        assert!(snapshot.get(&Key::from("T2")).is_none());
        assert!(snapshot.get(&Key::from("T1")).is_some());
    }
}
