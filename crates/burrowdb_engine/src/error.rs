//! Error types for the BurrowDB engine.

use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors reported by the engine when completing a request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    /// The named database does not exist.
    #[error("database not found: {name}")]
    DatabaseNotFound {
        /// Name of the database.
        name: String,
    },

    /// The named object store does not exist in the database.
    #[error("store not found: {name}")]
    StoreNotFound {
        /// Name of the store.
        name: String,
    },

    /// The named index does not exist on the store.
    #[error("index not found: {name} on store {store}")]
    IndexNotFound {
        /// Name of the index.
        name: String,
        /// Name of the store it was looked up on.
        store: String,
    },

    /// An open requested a version older than the stored one.
    #[error("version conflict: requested {requested}, stored {stored}")]
    VersionConflict {
        /// Version the open asked for.
        requested: u64,
        /// Version currently recorded for the database.
        stored: u64,
    },

    /// A value could not be used as a key.
    #[error("invalid key: {message}")]
    InvalidKey {
        /// Description of the rejected value.
        message: String,
    },

    /// A record is missing the field its store or index keys on.
    #[error("key path missing from record: {path}")]
    KeyPathMissing {
        /// The key path that resolved to nothing.
        path: String,
    },

    /// A commit would have stored two records under one unique index key.
    #[error("unique constraint violated on index {index}")]
    UniqueViolation {
        /// Name of the unique index.
        index: String,
    },

    /// The transaction has already been committed or aborted.
    #[error("transaction is closed")]
    TransactionClosed,

    /// A write was issued against a read-only transaction.
    #[error("transaction is read-only")]
    ReadOnlyTransaction,

    /// The store is not part of the transaction's declared scope.
    #[error("store not in transaction scope: {store}")]
    StoreNotInScope {
        /// Name of the out-of-scope store.
        store: String,
    },

    /// The cursor does not exist (never opened, or its transaction closed).
    #[error("cursor not found")]
    CursorNotFound,

    /// The engine worker has shut down.
    #[error("engine is closed")]
    EngineClosed,

    /// Operation not permitted in the current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why the operation is invalid.
        message: String,
    },
}

impl EngineError {
    /// Creates a database-not-found error.
    pub fn database_not_found(name: impl Into<String>) -> Self {
        Self::DatabaseNotFound { name: name.into() }
    }

    /// Creates a store-not-found error.
    pub fn store_not_found(name: impl Into<String>) -> Self {
        Self::StoreNotFound { name: name.into() }
    }

    /// Creates an index-not-found error.
    pub fn index_not_found(name: impl Into<String>, store: impl Into<String>) -> Self {
        Self::IndexNotFound {
            name: name.into(),
            store: store.into(),
        }
    }

    /// Creates an invalid-key error.
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey {
            message: message.into(),
        }
    }

    /// Creates a key-path-missing error.
    pub fn key_path_missing(path: impl Into<String>) -> Self {
        Self::KeyPathMissing { path: path.into() }
    }

    /// Creates a unique-violation error.
    pub fn unique_violation(index: impl Into<String>) -> Self {
        Self::UniqueViolation {
            index: index.into(),
        }
    }

    /// Creates a store-not-in-scope error.
    pub fn store_not_in_scope(store: impl Into<String>) -> Self {
        Self::StoreNotInScope {
            store: store.into(),
        }
    }

    /// Creates an invalid-operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }
}
