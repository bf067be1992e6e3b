mod codec;

use std::{cmp::Ordering, collections::BTreeMap, fmt, str::FromStr};

use serde_json::Value;

use crate::error::DeltaError;

/// Op-code marking a deleted value: `[old, 0, 0]`.
pub const DELETED: u64 = 0;
/// Op-code marking a character-level text patch: `[patch, 0, 2]`.
pub const TEXT_DIFF: u64 = 2;
/// Op-code marking an element that moved within its array: `[value, to, 3]`.
pub const ARRAY_MOVE: u64 = 3;

/// Reserved member tagging an array node on the wire.
pub const ARRAY_MARKER_KEY: &str = "_t";
pub const ARRAY_MARKER: &str = "a";

/// A structural difference between two JSON values.
///
/// Serialized in the compact positional form: leaves are 1 to 3 element
/// arrays and nodes are objects, with array nodes tagged by `"_t": "a"`.
#[derive(Debug, Clone, PartialEq)]
pub enum Delta {
    /// `[new]`
    Added(Value),
    /// `[old, new]`
    Modified(Value, Value),
    /// `[old, 0, 0]`
    Deleted(Value),
    /// `[patch, 0, 2]`
    TextDiff(String),
    /// `[value or "", to, 3]`, keyed by the source index.
    ///
    /// The wire form cannot tell a moved `""` apart from a move without a
    /// value, so `Some("")` decodes as `None`.
    Moved { value: Option<Value>, to: usize },
    Object(BTreeMap<String, Delta>),
    Array(BTreeMap<ArrayKey, Delta>),
}

impl Delta {
    pub fn kind(&self) -> &'static str {
        match self {
            Delta::Added(_) => "added",
            Delta::Modified(..) => "modified",
            Delta::Deleted(_) => "deleted",
            Delta::TextDiff(_) => "text diff",
            Delta::Moved { .. } => "moved",
            Delta::Object(_) => "object",
            Delta::Array(_) => "array",
        }
    }

    pub fn to_value(&self) -> Value {
        codec::encode(self)
    }

    pub fn from_value(value: &Value) -> Result<Self, DeltaError> {
        codec::decode(value)
    }
}

impl fmt::Display for Delta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}

impl From<Delta> for Value {
    fn from(delta: Delta) -> Self {
        delta.to_value()
    }
}

impl TryFrom<&Value> for Delta {
    type Error = DeltaError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        Delta::from_value(value)
    }
}

/// Key of an entry in an array delta.
///
/// `Right(n)` addresses position `n` of the new array, `Left(n)` position `n`
/// of the old array (deletions and move sources). Keys order by index with
/// `Left` before `Right`, so removals sort ahead of insertions at the same
/// position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArrayKey {
    Left(usize),
    Right(usize),
}

impl ArrayKey {
    pub fn index(&self) -> usize {
        match self {
            ArrayKey::Left(index) | ArrayKey::Right(index) => *index,
        }
    }

    pub fn is_left(&self) -> bool {
        matches!(self, ArrayKey::Left(_))
    }
}

impl Ord for ArrayKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.index()
            .cmp(&other.index())
            .then_with(|| other.is_left().cmp(&self.is_left()))
    }
}

impl PartialOrd for ArrayKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ArrayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayKey::Left(index) => write!(f, "_{index}"),
            ArrayKey::Right(index) => write!(f, "{index}"),
        }
    }
}

impl FromStr for ArrayKey {
    type Err = DeltaError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        let invalid = || DeltaError::invalid_delta(format!("invalid array delta key {key:?}"));
        match key.strip_prefix('_') {
            Some(index) => index.parse().map(ArrayKey::Left).map_err(|_| invalid()),
            None => key.parse().map(ArrayKey::Right).map_err(|_| invalid()),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};

    use super::*;

    #[test]
    fn array_keys_sort_removals_first() {
        let mut keys = vec![
            ArrayKey::Right(2),
            ArrayKey::Left(2),
            ArrayKey::Right(0),
            ArrayKey::Left(10),
            ArrayKey::Left(1),
        ];
        keys.sort();
        check!(
            keys == vec![
                ArrayKey::Right(0),
                ArrayKey::Left(1),
                ArrayKey::Left(2),
                ArrayKey::Right(2),
                ArrayKey::Left(10),
            ]
        );
    }

    #[test]
    fn array_keys_parse_and_display() {
        let_assert!(Ok(key) = "_12".parse::<ArrayKey>());
        check!(key == ArrayKey::Left(12));
        check!(key.to_string() == "_12");
        let_assert!(Ok(key) = "3".parse::<ArrayKey>());
        check!(key == ArrayKey::Right(3));
        check!("_t".parse::<ArrayKey>().is_err());
        check!("-1".parse::<ArrayKey>().is_err());
    }
}
