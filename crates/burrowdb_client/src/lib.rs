//! # BurrowDB Client
//!
//! Asynchronous request/response adapter over the callback-driven
//! `burrowdb_engine`.
//!
//! The engine reports completion by invoking deferred callbacks — one
//! success-or-error event per request, and one event per step for cursors.
//! This crate turns that interface into linear, awaitable operations:
//!
//! - **Connection manager** — [`Connection::open`] opens a named database
//!   and runs the idempotent schema bootstrap inside the engine's
//!   version-change upgrade callback.
//! - **Single-result adapter** — [`Connection::write_record`] and
//!   [`Connection::read_record`] await exactly one engine event each,
//!   through a one-shot resolver that makes double resolution
//!   unrepresentable.
//! - **Cursor accumulator** — [`Connection::scan_range`] and
//!   [`Connection::scan_index`] drain a cursor step by step, exactly one
//!   step in flight at a time, into a materialized, ordered `Vec`.
//!
//! Errors carry the engine's failure verbatim, split into the four
//! operation families: [`ConnectionError`], [`WriteError`], [`ReadError`],
//! [`ScanError`]. An absent record on a point read is `Ok(None)`, never an
//! error.
//!
//! ```no_run
//! use burrowdb_client::{Connection, IndexSpec, Key, Schema, StoreSpec};
//! use burrowdb_engine::Engine;
//! use serde_json::json;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = Engine::start();
//! let schema = Schema::new().with_store(
//!     StoreSpec::new("blog", "title").with_index(IndexSpec::new("AuthorIndex", "author")),
//! );
//! let conn = Connection::open(&engine.handle(), "myDatabase", &schema).await?;
//!
//! conn.write_record("blog", json!({"title": "T1", "author": "j"})).await?;
//! let post = conn.read_record("blog", Key::from("T1")).await?;
//! assert!(post.is_some());
//! let by_author = conn.scan_index("blog", "AuthorIndex", Key::from("j")).await?;
//! assert_eq!(by_author.len(), 1);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod connection;
mod cursor;
mod error;
mod ops;
mod resolver;

pub use connection::Connection;
pub use error::{ConnectionError, ReadError, ScanError, WriteError};

// The vocabulary types callers need alongside the adapter.
pub use burrowdb_engine::{IndexSpec, Key, KeyRange, Record, Schema, StoreSpec};
