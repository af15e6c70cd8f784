//! Named database state and the version-change upgrade context.

use crate::error::{EngineError, EngineResult};
use crate::schema::{IndexSpec, StoreSpec};
use crate::store::{ObjectStore, StoreSnapshot};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// One named database: a version number and its object stores.
#[derive(Debug, Clone)]
pub(crate) struct Database {
    name: String,
    version: u64,
    stores: BTreeMap<String, ObjectStore>,
}

impl Database {
    pub(crate) fn new(name: String, version: u64) -> Self {
        Self {
            name,
            version,
            stores: BTreeMap::new(),
        }
    }

    pub(crate) fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    pub(crate) fn store(&self, name: &str) -> EngineResult<&ObjectStore> {
        self.stores
            .get(name)
            .ok_or_else(|| EngineError::store_not_found(name))
    }

    pub(crate) fn store_exists(&self, name: &str) -> bool {
        self.stores.contains_key(name)
    }

    pub(crate) fn store_mut(&mut self, name: &str) -> EngineResult<&mut ObjectStore> {
        self.stores
            .get_mut(name)
            .ok_or_else(|| EngineError::store_not_found(name))
    }

    fn create_store(&mut self, spec: StoreSpec) -> EngineResult<()> {
        if self.stores.contains_key(&spec.name) {
            return Err(EngineError::invalid_operation(format!(
                "store {} already exists in database {}",
                spec.name, self.name
            )));
        }
        debug!(
            database = %self.name,
            store = %spec.name,
            key_path = %spec.key_path,
            indexes = spec.indexes.len(),
            "creating object store"
        );
        self.stores.insert(spec.name.clone(), ObjectStore::new(&spec));
        Ok(())
    }

    /// Snapshots every store in a transaction scope.
    pub(crate) fn snapshot_scope(
        &self,
        scope: &[String],
    ) -> EngineResult<HashMap<String, StoreSnapshot>> {
        let mut snapshots = HashMap::with_capacity(scope.len());
        for name in scope {
            snapshots.insert(name.clone(), self.store(name)?.snapshot());
        }
        Ok(snapshots)
    }
}

/// Handle through which the upgrade callback alters a database's schema.
///
/// An `UpgradeContext` exists only while an open request is performing a
/// version change; it is the sole path to creating stores and indexes.
/// Callers make their bootstrap idempotent by checking
/// [`UpgradeContext::store_exists`] before creating.
#[derive(Debug)]
pub struct UpgradeContext<'a> {
    db: &'a mut Database,
    /// Version the database is being upgraded from (0 for a new database).
    old_version: u64,
}

impl<'a> UpgradeContext<'a> {
    pub(crate) fn new(db: &'a mut Database, old_version: u64) -> Self {
        Self { db, old_version }
    }

    /// The version recorded before this upgrade began; 0 for a database
    /// that did not exist.
    #[must_use]
    pub fn old_version(&self) -> u64 {
        self.old_version
    }

    /// Returns true if the store already exists.
    #[must_use]
    pub fn store_exists(&self, name: &str) -> bool {
        self.db.store_exists(name)
    }

    /// Creates a store and its declared indexes.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidOperation` if a store with that name exists.
    pub fn create_store(&mut self, spec: StoreSpec) -> EngineResult<()> {
        self.db.create_store(spec)
    }

    /// Adds an index to an existing store, back-filling it from the
    /// store's records.
    pub fn create_index(&mut self, store: &str, spec: IndexSpec) -> EngineResult<()> {
        debug!(store = %store, index = %spec.name, "creating index");
        self.db.store_mut(store)?.create_index(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_store_rejects_duplicates() {
        let mut db = Database::new("db".into(), 1);
        let mut ctx = UpgradeContext::new(&mut db, 0);
        ctx.create_store(StoreSpec::new("blog", "title")).unwrap();
        assert!(ctx.store_exists("blog"));
        assert!(ctx.create_store(StoreSpec::new("blog", "title")).is_err());
    }

    #[test]
    fn create_index_requires_store() {
        let mut db = Database::new("db".into(), 1);
        let mut ctx = UpgradeContext::new(&mut db, 0);
        let result = ctx.create_index("blog", IndexSpec::new("AuthorIndex", "author"));
        assert!(matches!(result, Err(EngineError::StoreNotFound { .. })));
    }

    #[test]
    fn snapshot_scope_reports_unknown_store() {
        let db = Database::new("db".into(), 1);
        let result = db.snapshot_scope(&["missing".to_string()]);
        assert!(matches!(result, Err(EngineError::StoreNotFound { .. })));
    }
}
