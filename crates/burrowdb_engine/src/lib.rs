//! # BurrowDB Engine
//!
//! Embedded, transactional object store with a callback-driven request
//! interface.
//!
//! The engine stores JSON records in named object stores, keyed by a field
//! of each record (the store's *key path*), with non-unique secondary
//! indexes maintained on every committed write. All work happens on a
//! dedicated worker thread: callers submit requests through an
//! [`EngineHandle`] and receive exactly one completion callback per request
//! (cursor requests complete once per step until exhaustion).
//!
//! This crate is the lower half of BurrowDB. The `burrowdb_client` crate
//! adapts this event interface into linear, awaitable operations.
//!
//! ## Request model
//!
//! - Every request carries a [`Completion`] — a boxed `FnOnce` invoked
//!   exactly once, on the worker thread, with the request's result.
//! - Schema changes (create store / create index) are only possible inside
//!   the version-change upgrade callback passed to
//!   [`EngineHandle::open_database`].
//! - Read-write transactions over overlapping store sets are serialized;
//!   conflicting `begin` requests are queued FIFO and completed once the
//!   blocking transaction ends. Read-only transactions never wait and read
//!   a snapshot taken at begin.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cursor;
mod database;
mod error;
mod key;
mod request;
mod schema;
mod store;
mod transaction;
mod types;
mod worker;

pub use cursor::CursorEntry;
pub use database::UpgradeContext;
pub use error::{EngineError, EngineResult};
pub use key::{Key, KeyRange};
pub use request::{Completion, UpgradeFn};
pub use schema::{IndexSpec, Schema, StoreSpec};
pub use transaction::TransactionMode;
pub use types::{CursorId, TransactionId};
pub use worker::{Engine, EngineHandle};

/// A record payload: an application-defined JSON object.
pub type Record = serde_json::Value;
