//! The cursor accumulator: a multi-step cursor protocol collapsed into one
//! materialized collection.

use crate::resolver::await_engine;
use burrowdb_engine::{CursorId, EngineHandle, EngineResult, Record};
use tracing::trace;

/// Drains a cursor into an ordered `Vec`, strictly sequentially.
///
/// Each step is requested only after the previous record has been
/// recorded, so exactly one cursor step is in flight at any time and the
/// engine's ordering guarantee carries through to the collection: records
/// arrive in ascending key order with no skips or duplicates.
///
/// This is an eager, non-restartable collection: the whole range is read
/// before the caller sees any data. A mid-scan failure returns the error
/// alone — the partial accumulation is dropped here, never surfaced.
pub(crate) async fn drain_cursor(
    engine: &EngineHandle,
    cursor: CursorId,
) -> EngineResult<Vec<Record>> {
    let mut records = Vec::new();
    loop {
        let step = await_engine(|done| engine.cursor_continue(cursor, done)).await?;
        match step {
            Some(entry) => records.push(entry.record.as_ref().clone()),
            None => {
                trace!(%cursor, count = records.len(), "cursor exhausted");
                return Ok(records);
            }
        }
    }
}
