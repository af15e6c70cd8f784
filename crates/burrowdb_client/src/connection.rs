//! Connection management: opening a database and bootstrapping its schema.

use crate::error::ConnectionError;
use crate::resolver::await_engine;
use burrowdb_engine::{EngineHandle, EngineResult, Schema, UpgradeContext};
use tracing::debug;

/// A handle to one open, named database.
///
/// The connection is cheap to clone and may be used to run arbitrarily
/// many concurrent operations; each operation owns its own transaction.
/// Opening the same database concurrently from several tasks is not
/// coordinated here — callers serialize opens, per the engine's contract.
#[derive(Clone, Debug)]
pub struct Connection {
    pub(crate) engine: EngineHandle,
    pub(crate) database: String,
}

impl Connection {
    /// Opens (or creates) `database` and ensures it contains the schema's
    /// stores and indexes.
    ///
    /// The bootstrap runs inside the engine's one-time version-change
    /// upgrade callback and is idempotent: stores that already exist are
    /// left untouched, so reopening an initialized database changes
    /// nothing.
    ///
    /// # Errors
    ///
    /// [`ConnectionError`] if the engine reports an open or upgrade
    /// failure.
    pub async fn open(
        engine: &EngineHandle,
        database: &str,
        schema: &Schema,
    ) -> Result<Self, ConnectionError> {
        Self::open_with_version(engine, database, None, schema).await
    }

    /// Opens `database` at an explicit version.
    ///
    /// Requesting a version below the stored one fails with a version
    /// conflict; requesting a higher one re-runs the bootstrap for stores
    /// added to the schema since the last open.
    pub async fn open_with_version(
        engine: &EngineHandle,
        database: &str,
        version: Option<u64>,
        schema: &Schema,
    ) -> Result<Self, ConnectionError> {
        let bootstrap_schema = schema.clone();
        let resolved = await_engine(|done| {
            engine.open_database(
                database,
                version,
                Box::new(move |ctx| bootstrap(ctx, &bootstrap_schema)),
                done,
            )
        })
        .await
        .map_err(|source| ConnectionError::new(database, source))?;

        debug!(database = %database, version = resolved, "connection opened");
        Ok(Self {
            engine: engine.clone(),
            database: database.to_string(),
        })
    }

    /// Name of the database this connection is bound to.
    #[must_use]
    pub fn database(&self) -> &str {
        &self.database
    }
}

/// Creates each schema store that is not already present, with its
/// indexes. Safe to run against an already-initialized database.
fn bootstrap(ctx: &mut UpgradeContext<'_>, schema: &Schema) -> EngineResult<()> {
    for store in &schema.stores {
        if !ctx.store_exists(&store.name) {
            ctx.create_store(store.clone())?;
        }
    }
    Ok(())
}
