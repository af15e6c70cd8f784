//! Declarative schema: store and index definitions.
//!
//! A [`Schema`] lists the stores (and their indexes) a database should
//! have. The engine only consults these definitions inside the
//! version-change upgrade callback; after that, store and index sets are
//! fixed for the life of the database.

/// Definition of a secondary index on a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    /// Index name, unique within its store.
    pub name: String,
    /// Dot-separated field path whose value keys the index.
    pub key_path: String,
    /// Whether two records may share an index key.
    pub unique: bool,
}

impl IndexSpec {
    /// Creates a non-unique index definition.
    pub fn new(name: impl Into<String>, key_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key_path: key_path.into(),
            unique: false,
        }
    }

    /// Creates a unique index definition.
    pub fn unique(name: impl Into<String>, key_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key_path: key_path.into(),
            unique: true,
        }
    }
}

/// Definition of an object store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSpec {
    /// Store name, unique within its database.
    pub name: String,
    /// Dot-separated field path holding each record's primary key.
    pub key_path: String,
    /// Indexes created together with the store.
    pub indexes: Vec<IndexSpec>,
}

impl StoreSpec {
    /// Creates a store definition with no indexes.
    pub fn new(name: impl Into<String>, key_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key_path: key_path.into(),
            indexes: Vec::new(),
        }
    }

    /// Adds an index to the definition.
    #[must_use]
    pub fn with_index(mut self, index: IndexSpec) -> Self {
        self.indexes.push(index);
        self
    }
}

/// The set of stores a connection expects a database to contain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    /// Store definitions.
    pub stores: Vec<StoreSpec>,
}

impl Schema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a store definition.
    #[must_use]
    pub fn with_store(mut self, store: StoreSpec) -> Self {
        self.stores.push(store);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_stores_and_indexes() {
        let schema = Schema::new().with_store(
            StoreSpec::new("blog", "title")
                .with_index(IndexSpec::new("AuthorIndex", "author"))
                .with_index(IndexSpec::unique("SlugIndex", "slug")),
        );

        assert_eq!(schema.stores.len(), 1);
        let store = &schema.stores[0];
        assert_eq!(store.key_path, "title");
        assert_eq!(store.indexes.len(), 2);
        assert!(!store.indexes[0].unique);
        assert!(store.indexes[1].unique);
    }
}
