//! Engine-side cursors: single-step iteration over a transaction snapshot.
//!
//! A cursor remembers only its last position; each step is answered with a
//! fresh range probe against the snapshot, so no iterator state borrows the
//! store across requests. Exhaustion is sticky: stepping a finished cursor
//! keeps returning `None`.

use crate::error::{EngineError, EngineResult};
use crate::key::{Key, KeyRange};
use crate::store::StoreSnapshot;
use crate::types::{CursorId, TransactionId};
use serde_json::Value;
use std::collections::BTreeSet;
use std::ops::{Bound, RangeBounds};
use std::sync::Arc;

/// One record delivered by a cursor step.
#[derive(Debug, Clone, PartialEq)]
pub struct CursorEntry {
    /// The key the cursor ordered by: the primary key for store cursors,
    /// the index key for index cursors.
    pub key: Key,
    /// The record's primary key.
    pub primary_key: Key,
    /// The record payload.
    pub record: Arc<Value>,
}

/// What a cursor iterates over.
#[derive(Debug, Clone)]
pub(crate) enum CursorSource {
    /// The store's primary-key ordering.
    Store,
    /// A named index ordering, ties broken by primary key.
    Index {
        /// Index name.
        index: String,
    },
}

#[derive(Debug, Clone)]
enum Position {
    Start,
    AtPrimary(Key),
    AtIndex { index_key: Key, primary: Key },
    Done,
}

/// A stateful iterator bound to one transaction.
#[derive(Debug)]
pub(crate) struct Cursor {
    id: CursorId,
    txn: TransactionId,
    store: String,
    source: CursorSource,
    range: KeyRange,
    position: Position,
}

impl Cursor {
    pub(crate) fn new(
        id: CursorId,
        txn: TransactionId,
        store: String,
        source: CursorSource,
        range: KeyRange,
    ) -> Self {
        Self {
            id,
            txn,
            store,
            source,
            range,
            position: Position::Start,
        }
    }

    pub(crate) fn id(&self) -> CursorId {
        self.id
    }

    pub(crate) fn txn(&self) -> TransactionId {
        self.txn
    }

    pub(crate) fn store(&self) -> &str {
        &self.store
    }

    /// Advances one step, returning the next record or `None` at
    /// exhaustion.
    pub(crate) fn step(&mut self, snapshot: &StoreSnapshot) -> EngineResult<Option<CursorEntry>> {
        let next = match &self.source {
            CursorSource::Store => self.next_primary(snapshot),
            CursorSource::Index { index } => self.next_indexed(snapshot, index)?,
        };
        match next {
            Some(entry) => {
                self.position = match &self.source {
                    CursorSource::Store => Position::AtPrimary(entry.primary_key.clone()),
                    CursorSource::Index { .. } => Position::AtIndex {
                        index_key: entry.key.clone(),
                        primary: entry.primary_key.clone(),
                    },
                };
                Ok(Some(entry))
            }
            None => {
                self.position = Position::Done;
                Ok(None)
            }
        }
    }

    fn next_primary(&self, snapshot: &StoreSnapshot) -> Option<CursorEntry> {
        let (primary, record) = match &self.position {
            Position::Start => snapshot.records.range(&self.range).next()?,
            Position::AtPrimary(last) => snapshot
                .records
                .range((Bound::Excluded(last), self.range.end_bound()))
                .next()?,
            Position::Done => return None,
            Position::AtIndex { .. } => return None,
        };
        Some(CursorEntry {
            key: primary.clone(),
            primary_key: primary.clone(),
            record: Arc::clone(record),
        })
    }

    fn next_indexed(
        &self,
        snapshot: &StoreSnapshot,
        index: &str,
    ) -> EngineResult<Option<CursorEntry>> {
        let entries = snapshot
            .indexes
            .get(index)
            .ok_or_else(|| EngineError::index_not_found(index, &self.store))?;

        let next = match &self.position {
            Position::Start => first_in(entries.range(&self.range)),
            Position::AtIndex { index_key, primary } => {
                // Next record under the same index key, then the following
                // index keys within the range.
                let same_key = entries.get(index_key).and_then(|set| {
                    set.range((Bound::Excluded(primary), Bound::Unbounded))
                        .next()
                        .map(|p| (index_key.clone(), p.clone()))
                });
                same_key.or_else(|| {
                    first_in(entries.range((Bound::Excluded(index_key), self.range.end_bound())))
                })
            }
            Position::Done => None,
            Position::AtPrimary(_) => None,
        };

        let Some((index_key, primary)) = next else {
            return Ok(None);
        };
        let record = snapshot.records.get(&primary).cloned().ok_or_else(|| {
            EngineError::invalid_operation(format!(
                "index {index} references missing record {primary}"
            ))
        })?;
        Ok(Some(CursorEntry {
            key: index_key,
            primary_key: primary,
            record,
        }))
    }
}

/// First (index key, primary key) pair of an index range.
fn first_in<'a>(
    mut range: impl Iterator<Item = (&'a Key, &'a BTreeSet<Key>)>,
) -> Option<(Key, Key)> {
    range.find_map(|(index_key, set)| {
        set.iter()
            .next()
            .map(|primary| (index_key.clone(), primary.clone()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{IndexSpec, StoreSpec};
    use crate::store::ObjectStore;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn snapshot_with_posts() -> StoreSnapshot {
        let mut store = ObjectStore::new(
            &StoreSpec::new("blog", "title")
                .with_index(IndexSpec::new("AuthorIndex", "author"))
                .with_index(IndexSpec::new("PublishDateIndex", "publishDate")),
        );
        let posts = [
            json!({"title": "T1", "author": "j", "publishDate": "2018-03-10"}),
            json!({"title": "T2", "author": "j", "publishDate": "2018-03-02"}),
            json!({"title": "T3", "author": "p", "publishDate": "2017-11-13"}),
        ];
        let mut batch = BTreeMap::new();
        for post in posts {
            batch.insert(store.primary_key_of(&post).unwrap(), Arc::new(post));
        }
        store.apply_batch(batch);
        store.snapshot()
    }

    fn drain(cursor: &mut Cursor, snapshot: &StoreSnapshot) -> Vec<Key> {
        let mut keys = Vec::new();
        while let Some(entry) = cursor.step(snapshot).unwrap() {
            keys.push(entry.primary_key);
        }
        keys
    }

    #[test]
    fn store_cursor_walks_primary_order() {
        let snapshot = snapshot_with_posts();
        let mut cursor = Cursor::new(
            CursorId::new(1),
            TransactionId::new(1),
            "blog".into(),
            CursorSource::Store,
            KeyRange::lower_bound("T2"),
        );
        assert_eq!(
            drain(&mut cursor, &snapshot),
            vec![Key::from("T2"), Key::from("T3")]
        );
    }

    #[test]
    fn exhausted_cursor_stays_exhausted() {
        let snapshot = snapshot_with_posts();
        let mut cursor = Cursor::new(
            CursorId::new(1),
            TransactionId::new(1),
            "blog".into(),
            CursorSource::Store,
            KeyRange::all(),
        );
        drain(&mut cursor, &snapshot);
        assert!(cursor.step(&snapshot).unwrap().is_none());
    }

    #[test]
    fn index_cursor_breaks_ties_by_primary_key() {
        let snapshot = snapshot_with_posts();
        let mut cursor = Cursor::new(
            CursorId::new(1),
            TransactionId::new(1),
            "blog".into(),
            CursorSource::Index {
                index: "AuthorIndex".into(),
            },
            KeyRange::only("j"),
        );
        // Both "j" posts, ascending primary key; "p" is out of range.
        assert_eq!(
            drain(&mut cursor, &snapshot),
            vec![Key::from("T1"), Key::from("T2")]
        );
    }

    #[test]
    fn index_cursor_honors_date_ranges() {
        let snapshot = snapshot_with_posts();
        let mut cursor = Cursor::new(
            CursorId::new(1),
            TransactionId::new(1),
            "blog".into(),
            CursorSource::Index {
                index: "PublishDateIndex".into(),
            },
            KeyRange::bound("2018-01-01", "2018-12-31"),
        );
        // Ascending index-key (date) order.
        assert_eq!(
            drain(&mut cursor, &snapshot),
            vec![Key::from("T2"), Key::from("T1")]
        );
    }

    #[test]
    fn unknown_index_is_reported() {
        let snapshot = snapshot_with_posts();
        let mut cursor = Cursor::new(
            CursorId::new(1),
            TransactionId::new(1),
            "blog".into(),
            CursorSource::Index {
                index: "Nope".into(),
            },
            KeyRange::all(),
        );
        assert!(matches!(
            cursor.step(&snapshot),
            Err(EngineError::IndexNotFound { .. })
        ));
    }
}
