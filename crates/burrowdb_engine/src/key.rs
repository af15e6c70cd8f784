//! Key domain: ordered keys extracted from JSON records, and key ranges.
//!
//! Keys are totally ordered: integers sort before text, text before arrays,
//! and values of the same kind compare by content. Dates are represented as
//! ISO-8601 text (`YYYY-MM-DD`), so text ordering is chronological. JSON
//! floats, booleans, `null`, and objects are not valid keys; the engine
//! never evaluates computed key expressions, so any derived value an index
//! should order by must be stored as a real field of the record.

use crate::error::{EngineError, EngineResult};
use serde_json::Value;
use std::fmt;
use std::ops::{Bound, RangeBounds};

/// An ordered key value.
///
/// The derived `Ord` gives the documented ordering: variant rank first
/// (integer < text < array), then content. Array keys compare
/// lexicographically element by element.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    /// Signed integer key.
    Integer(i64),
    /// UTF-8 text key.
    Text(String),
    /// Composite key of ordered sub-keys.
    Array(Vec<Key>),
}

impl Key {
    /// Converts a JSON value into a key.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` for floats, booleans, `null`, and objects.
    pub fn from_value(value: &Value) -> EngineResult<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(Key::Integer).ok_or_else(|| {
                EngineError::invalid_key(format!("non-integer number {n} cannot be a key"))
            }),
            Value::String(s) => Ok(Key::Text(s.clone())),
            Value::Array(items) => items
                .iter()
                .map(Key::from_value)
                .collect::<EngineResult<Vec<_>>>()
                .map(Key::Array),
            other => Err(EngineError::invalid_key(format!(
                "{} cannot be a key",
                json_kind(other)
            ))),
        }
    }

    /// Extracts the key a record stores under the given key path.
    ///
    /// The path is a dot-separated chain of object fields. A path that
    /// resolves to nothing is `KeyPathMissing`; a path that resolves to a
    /// non-key value is `InvalidKey`.
    pub fn extract(record: &Value, key_path: &str) -> EngineResult<Self> {
        match lookup_path(record, key_path) {
            Some(value) => Self::from_value(value),
            None => Err(EngineError::key_path_missing(key_path)),
        }
    }

    /// Extracts an index key from a record, if the record has one.
    ///
    /// Index maintenance skips records whose key path is absent or does not
    /// hold a valid key; such records are simply not indexed.
    #[must_use]
    pub fn extract_for_index(record: &Value, key_path: &str) -> Option<Self> {
        lookup_path(record, key_path).and_then(|value| Self::from_value(value).ok())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Integer(n) => write!(f, "{n}"),
            Key::Text(s) => write!(f, "{s:?}"),
            Key::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<i64> for Key {
    fn from(n: i64) -> Self {
        Key::Integer(n)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Text(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Text(s)
    }
}

/// Resolves a dot-separated field path against a JSON value.
fn lookup_path<'a>(record: &'a Value, key_path: &str) -> Option<&'a Value> {
    let mut current = record;
    for segment in key_path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A half-open or closed interval over the key space.
///
/// Ranges are passed through to cursors verbatim; the engine does no range
/// rewriting. A single equality key is the degenerate range [`KeyRange::only`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRange {
    lower: Bound<Key>,
    upper: Bound<Key>,
}

impl KeyRange {
    /// The unbounded range containing every key.
    #[must_use]
    pub fn all() -> Self {
        Self {
            lower: Bound::Unbounded,
            upper: Bound::Unbounded,
        }
    }

    /// The range containing exactly one key.
    #[must_use]
    pub fn only(key: impl Into<Key>) -> Self {
        let key = key.into();
        Self {
            lower: Bound::Included(key.clone()),
            upper: Bound::Included(key),
        }
    }

    /// Keys greater than or equal to `key`, with an open upper end.
    #[must_use]
    pub fn lower_bound(key: impl Into<Key>) -> Self {
        Self {
            lower: Bound::Included(key.into()),
            upper: Bound::Unbounded,
        }
    }

    /// Keys less than or equal to `key`, with an open lower end.
    #[must_use]
    pub fn upper_bound(key: impl Into<Key>) -> Self {
        Self {
            lower: Bound::Unbounded,
            upper: Bound::Included(key.into()),
        }
    }

    /// Keys between `lower` and `upper`, both inclusive.
    #[must_use]
    pub fn bound(lower: impl Into<Key>, upper: impl Into<Key>) -> Self {
        Self {
            lower: Bound::Included(lower.into()),
            upper: Bound::Included(upper.into()),
        }
    }

    /// Returns true if `key` falls inside the range.
    #[must_use]
    pub fn contains(&self, key: &Key) -> bool {
        (match &self.lower {
            Bound::Included(lo) => key >= lo,
            Bound::Excluded(lo) => key > lo,
            Bound::Unbounded => true,
        }) && (match &self.upper {
            Bound::Included(hi) => key <= hi,
            Bound::Excluded(hi) => key < hi,
            Bound::Unbounded => true,
        })
    }

}

impl RangeBounds<Key> for KeyRange {
    fn start_bound(&self) -> Bound<&Key> {
        self.lower.as_ref()
    }

    fn end_bound(&self) -> Bound<&Key> {
        self.upper.as_ref()
    }
}

impl RangeBounds<Key> for &KeyRange {
    fn start_bound(&self) -> Bound<&Key> {
        self.lower.as_ref()
    }

    fn end_bound(&self) -> Bound<&Key> {
        self.upper.as_ref()
    }
}

impl From<Key> for KeyRange {
    fn from(key: Key) -> Self {
        KeyRange::only(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn integers_sort_before_text_before_arrays() {
        let int = Key::Integer(i64::MAX);
        let text = Key::Text(String::new());
        let array = Key::Array(vec![]);
        assert!(int < text);
        assert!(text < array);
    }

    #[test]
    fn iso_dates_sort_chronologically() {
        let earlier = Key::from("2017-11-13");
        let later = Key::from("2018-03-02");
        assert!(earlier < later);
    }

    #[test]
    fn from_value_rejects_non_key_types() {
        for value in [json!(null), json!(true), json!(1.5), json!({"a": 1})] {
            assert!(matches!(
                Key::from_value(&value),
                Err(EngineError::InvalidKey { .. })
            ));
        }
    }

    #[test]
    fn extract_follows_nested_paths() {
        let record = json!({"meta": {"slug": "hello"}});
        assert_eq!(Key::extract(&record, "meta.slug").unwrap(), Key::from("hello"));
        assert!(matches!(
            Key::extract(&record, "meta.missing"),
            Err(EngineError::KeyPathMissing { .. })
        ));
    }

    #[test]
    fn extract_for_index_skips_unusable_values() {
        let record = json!({"rating": 4.5});
        assert_eq!(Key::extract_for_index(&record, "rating"), None);
        assert_eq!(Key::extract_for_index(&record, "absent"), None);
    }

    #[test]
    fn range_containment() {
        let range = KeyRange::bound("2018-01-01", "2018-12-31");
        assert!(range.contains(&Key::from("2018-03-10")));
        assert!(!range.contains(&Key::from("2017-11-13")));
        assert!(!range.contains(&Key::from("2019-01-01")));

        let from = KeyRange::lower_bound("I");
        assert!(from.contains(&Key::from("I")));
        assert!(from.contains(&Key::from("Windows")));
        assert!(!from.contains(&Key::from("Faites")));
    }

    #[test]
    fn only_range_matches_single_key() {
        let range = KeyRange::only("j.loscos");
        assert!(range.contains(&Key::from("j.loscos")));
        assert!(!range.contains(&Key::from("j.loscoz")));
    }

    fn arb_key() -> impl Strategy<Value = Key> {
        let leaf = prop_oneof![
            any::<i64>().prop_map(Key::Integer),
            "[a-z0-9]{0,8}".prop_map(Key::Text),
        ];
        leaf.prop_recursive(2, 8, 4, |inner| {
            prop::collection::vec(inner, 0..4).prop_map(Key::Array)
        })
    }

    proptest! {
        #[test]
        fn ordering_is_transitive(a in arb_key(), b in arb_key(), c in arb_key()) {
            let mut keys = [a, b, c];
            keys.sort();
            prop_assert!(keys[0] <= keys[1] && keys[1] <= keys[2]);
            prop_assert!(keys[0] <= keys[2]);
        }

        #[test]
        fn bound_range_agrees_with_ordering(a in arb_key(), b in arb_key(), probe in arb_key()) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let range = KeyRange::bound(lo.clone(), hi.clone());
            prop_assert_eq!(range.contains(&probe), probe >= lo && probe <= hi);
        }
    }
}
