//! Wire encoding of [`Delta`].

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::Error as _,
    ser::SerializeMap,
};
use serde_json::{Map, Value, json};

use super::{ARRAY_MARKER, ARRAY_MARKER_KEY, ARRAY_MOVE, ArrayKey, DELETED, Delta, TEXT_DIFF};
use crate::error::DeltaError;

pub(super) fn encode(delta: &Delta) -> Value {
    match delta {
        Delta::Added(value) => json!([value]),
        Delta::Modified(old, new) => json!([old, new]),
        Delta::Deleted(old) => json!([old, DELETED, DELETED]),
        Delta::TextDiff(patch) => json!([patch, DELETED, TEXT_DIFF]),
        Delta::Moved { value, to } => match value {
            Some(value) => json!([value, to, ARRAY_MOVE]),
            None => json!(["", to, ARRAY_MOVE]),
        },
        Delta::Object(members) => Value::Object(
            members
                .iter()
                .map(|(key, child)| (key.clone(), encode(child)))
                .collect(),
        ),
        Delta::Array(entries) => {
            let mut map = Map::with_capacity(entries.len() + 1);
            map.insert(ARRAY_MARKER_KEY.to_string(), json!(ARRAY_MARKER));
            for (key, child) in entries {
                map.insert(key.to_string(), encode(child));
            }
            Value::Object(map)
        }
    }
}

pub(super) fn decode(value: &Value) -> Result<Delta, DeltaError> {
    match value {
        Value::Array(items) => decode_leaf(items),
        Value::Object(map) => match map.get(ARRAY_MARKER_KEY) {
            Some(marker) if marker == ARRAY_MARKER => {
                let entries = map
                    .iter()
                    .filter(|(key, _)| *key != ARRAY_MARKER_KEY)
                    .map(|(key, child)| Ok((key.parse::<ArrayKey>()?, decode(child)?)))
                    .collect::<Result<_, DeltaError>>()?;
                Ok(Delta::Array(entries))
            }
            Some(marker) => Err(DeltaError::invalid_delta(format!(
                "unknown node type {marker}"
            ))),
            None => {
                let members = map
                    .iter()
                    .map(|(key, child)| Ok((key.clone(), decode(child)?)))
                    .collect::<Result<_, DeltaError>>()?;
                Ok(Delta::Object(members))
            }
        },
        other => Err(DeltaError::invalid_delta(format!(
            "expected an array or object, found {other}"
        ))),
    }
}

fn decode_leaf(items: &[Value]) -> Result<Delta, DeltaError> {
    match items {
        [value] => Ok(Delta::Added(value.clone())),
        [old, new] => Ok(Delta::Modified(old.clone(), new.clone())),
        [first, second, op] => match op.as_u64() {
            Some(DELETED) => Ok(Delta::Deleted(first.clone())),
            Some(TEXT_DIFF) => first
                .as_str()
                .map(|patch| Delta::TextDiff(patch.to_string()))
                .ok_or_else(|| DeltaError::invalid_delta("text diff payload must be a string")),
            Some(ARRAY_MOVE) => {
                let to = second
                    .as_u64()
                    .and_then(|to| usize::try_from(to).ok())
                    .ok_or_else(|| DeltaError::invalid_delta(format!("invalid move target {second}")))?;
                let value = match first {
                    Value::String(s) if s.is_empty() => None,
                    value => Some(value.clone()),
                };
                Ok(Delta::Moved { value, to })
            }
            _ => Err(DeltaError::invalid_delta(format!("unknown delta type {op}"))),
        },
        _ => Err(DeltaError::invalid_delta(format!(
            "leaf deltas have 1 to 3 elements, found {}",
            items.len()
        ))),
    }
}

impl Serialize for Delta {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Delta::Added(value) => (value,).serialize(serializer),
            Delta::Modified(old, new) => (old, new).serialize(serializer),
            Delta::Deleted(old) => (old, DELETED, DELETED).serialize(serializer),
            Delta::TextDiff(patch) => (patch, DELETED, TEXT_DIFF).serialize(serializer),
            Delta::Moved { value: Some(value), to } => (value, to, ARRAY_MOVE).serialize(serializer),
            Delta::Moved { value: None, to } => ("", to, ARRAY_MOVE).serialize(serializer),
            Delta::Object(members) => members.serialize(serializer),
            Delta::Array(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len() + 1))?;
                map.serialize_entry(ARRAY_MARKER_KEY, ARRAY_MARKER)?;
                for (key, child) in entries {
                    map.serialize_entry(&key.to_string(), child)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Delta {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        decode(&value).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use assert2::{check, let_assert};
    use serde_json::json;

    use super::*;

    #[test]
    fn leaves_use_positional_shapes() {
        check!(encode(&Delta::Added(json!(1))) == json!([1]));
        check!(encode(&Delta::Modified(json!(1), json!("x"))) == json!([1, "x"]));
        check!(encode(&Delta::Deleted(json!({"a": 1}))) == json!([{"a": 1}, 0, 0]));
        check!(encode(&Delta::TextDiff("@@ -1 +1 @@\n-a\n+b\n".into())) == json!(["@@ -1 +1 @@\n-a\n+b\n", 0, 2]));
        check!(encode(&Delta::Moved { value: None, to: 4 }) == json!(["", 4, 3]));
        check!(encode(&Delta::Moved { value: Some(json!(7)), to: 4 }) == json!([7, 4, 3]));
    }

    #[test]
    fn moved_empty_string_loses_its_value() {
        let moved = Delta::Moved {
            value: Some(json!("")),
            to: 1,
        };
        check!(decode(&encode(&moved)) == Ok(Delta::Moved { value: None, to: 1 }));
    }

    #[test]
    fn array_nodes_carry_marker() {
        let delta = Delta::Array(BTreeMap::from([
            (ArrayKey::Left(1), Delta::Deleted(json!(2))),
            (ArrayKey::Right(3), Delta::Added(json!(9))),
        ]));
        let encoded = encode(&delta);
        check!(encoded == json!({"_t": "a", "_1": [2, 0, 0], "3": [9]}));
        let_assert!(Ok(decoded) = decode(&encoded));
        check!(decoded == delta);
    }

    #[test]
    fn serde_matches_value_encoding() {
        let delta = Delta::Object(BTreeMap::from([
            ("a".to_string(), Delta::Modified(json!(1), json!(2))),
            (
                "list".to_string(),
                Delta::Array(BTreeMap::from([(ArrayKey::Left(0), Delta::Moved { value: None, to: 2 })])),
            ),
        ]));
        let_assert!(Ok(serialized) = serde_json::to_value(&delta));
        check!(serialized == delta.to_value());
        let_assert!(Ok(parsed) = serde_json::from_value::<Delta>(serialized));
        check!(parsed == delta);
    }

    #[test]
    fn rejects_malformed_deltas() {
        let_assert!(Err(DeltaError::InvalidDelta { .. }) = decode(&json!([])));
        let_assert!(Err(DeltaError::InvalidDelta { .. }) = decode(&json!([1, 2, 3, 4])));
        let_assert!(Err(DeltaError::InvalidDelta { .. }) = decode(&json!([1, 0, 9])));
        let_assert!(Err(DeltaError::InvalidDelta { .. }) = decode(&json!([1, 0, 2])));
        let_assert!(Err(DeltaError::InvalidDelta { .. }) = decode(&json!(["", -1, 3])));
        let_assert!(Err(DeltaError::InvalidDelta { .. }) = decode(&json!({"_t": "x"})));
        let_assert!(Err(DeltaError::InvalidDelta { .. }) = decode(&json!({"_t": "a", "k": [1]})));
        let_assert!(Err(DeltaError::InvalidDelta { .. }) = decode(&json!(5)));
        check!(serde_json::from_value::<Delta>(json!("nope")).is_err());
    }
}
