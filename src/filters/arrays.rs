//! Arrays: element matching, move detection, and the index bookkeeping needed
//! to patch and reverse array deltas.
//!
//! Diffing trims the common head and tail first. When what is left on one
//! side is empty the delta is a block of additions or removals; otherwise an
//! LCS over the remaining middles decides which elements stayed, and every
//! added element is checked against the removed ones to turn a
//! removal/addition pair into a move.

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;
use tracing::{debug, trace};

use super::strict_eq;
use crate::{
    context::{ChildName, DiffContext, PatchContext, ReverseContext},
    delta::{ArrayKey, Delta},
    error::DeltaError,
    lcs::lcs,
    options::{ObjectHash, Options},
    pipeline::{ContextTree, NodeId},
};

/// Decides whether two elements are the same logical item.
struct Matcher<'o> {
    object_hash: Option<&'o ObjectHash>,
    match_by_position: bool,
    hashes1: HashMap<usize, Option<String>>,
    hashes2: HashMap<usize, Option<String>>,
}

impl<'o> Matcher<'o> {
    fn new(options: &'o Options, array1: &[Value], array2: &[Value]) -> Self {
        let match_by_position = match (&options.object_hash, options.match_by_position) {
            (None, None) if !array1.is_empty() && !array2.is_empty() => !arrays_have_match_by_ref(array1, array2),
            (_, explicit) => explicit.unwrap_or(false),
        };
        Matcher {
            object_hash: options.object_hash.as_ref(),
            match_by_position,
            hashes1: HashMap::new(),
            hashes2: HashMap::new(),
        }
    }

    /// Hashes are cached by index, so they have to go whenever the indices
    /// start referring to a different slice.
    fn reset(&mut self) {
        self.hashes1.clear();
        self.hashes2.clear();
    }

    fn matches(&mut self, array1: &[Value], array2: &[Value], index1: usize, index2: usize) -> bool {
        let (Some(value1), Some(value2)) = (array1.get(index1), array2.get(index2)) else {
            return false;
        };
        if strict_eq(value1, value2) {
            return true;
        }
        if !is_object_like(value1) || !is_object_like(value2) {
            return false;
        }
        let Some(hash) = self.object_hash else {
            return self.match_by_position && index1 == index2;
        };
        let hash1 = self
            .hashes1
            .entry(index1)
            .or_insert_with(|| hash(value1, Some(index1)));
        let Some(hash1) = hash1.as_deref() else {
            return false;
        };
        let hash2 = self
            .hashes2
            .entry(index2)
            .or_insert_with(|| hash(value2, Some(index2)));
        hash2.as_deref() == Some(hash1)
    }
}

fn is_object_like(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_) | Value::Null)
}

/// Whether some element of `array1` is strictly equal to an element of
/// `array2` at a different position.
pub fn arrays_have_match_by_ref(array1: &[Value], array2: &[Value]) -> bool {
    array1.iter().enumerate().any(|(index1, value1)| {
        array2
            .iter()
            .enumerate()
            .any(|(index2, value2)| index1 != index2 && strict_eq(value1, value2))
    })
}

pub fn diff_filter(tree: &mut ContextTree<DiffContext<'_>>, id: NodeId, options: &Options) -> Result<(), DeltaError> {
    let ctx = tree.get(id);
    let (Some(Value::Array(array1)), Some(Value::Array(array2))) = (ctx.left, ctx.right) else {
        return Ok(());
    };
    let (len1, len2) = (array1.len(), array2.len());
    let mut matcher = Matcher::new(options, array1, array2);

    let mut common_head = 0;
    while common_head < len1 && common_head < len2 && matcher.matches(array1, array2, common_head, common_head) {
        let child = DiffContext::new(array1.get(common_head), array2.get(common_head));
        tree.push(id, ChildName::Index(common_head), child);
        common_head += 1;
    }
    let mut common_tail = 0;
    while common_tail + common_head < len1
        && common_tail + common_head < len2
        && matcher.matches(array1, array2, len1 - 1 - common_tail, len2 - 1 - common_tail)
    {
        let (index1, index2) = (len1 - 1 - common_tail, len2 - 1 - common_tail);
        tree.push(id, ChildName::Index(index2), DiffContext::new(array1.get(index1), array2.get(index2)));
        common_tail += 1;
    }
    debug!(len1, len2, common_head, common_tail, "diffing arrays");

    if common_head + common_tail == len1 {
        let result = (len1 != len2).then(|| {
            Delta::Array(
                (common_head..len2 - common_tail)
                    .map(|index| (ArrayKey::Right(index), Delta::Added(options.embed(&array2[index]))))
                    .collect(),
            )
        });
        tree.get_mut(id).set_result(result);
        tree.exit(id);
        return Ok(());
    }
    if common_head + common_tail == len2 {
        let entries = (common_head..len1 - common_tail)
            .map(|index| (ArrayKey::Left(index), Delta::Deleted(options.embed(&array1[index]))))
            .collect();
        tree.get_mut(id).set_result(Some(Delta::Array(entries)));
        tree.exit(id);
        return Ok(());
    }

    matcher.reset();
    let trimmed1 = &array1[common_head..len1 - common_tail];
    let trimmed2 = &array2[common_head..len2 - common_tail];
    let sequence = lcs(trimmed1.len(), trimmed2.len(), |index1, index2| {
        matcher.matches(trimmed1, trimmed2, index1, index2)
    });
    trace!(matched = sequence.len(), "longest common subsequence");

    let mut entries = BTreeMap::new();
    let mut removed = Vec::new();
    for index in common_head..len1 - common_tail {
        if !sequence.indices1.contains(&(index - common_head)) {
            entries.insert(ArrayKey::Left(index), Delta::Deleted(options.embed(&array1[index])));
            removed.push(index);
        }
    }

    for index in common_head..len2 - common_tail {
        let position = sequence.indices2.iter().position(|&index2| index2 == index - common_head);
        if let Some(position) = position {
            let index1 = sequence.indices1[position] + common_head;
            tree.push(id, ChildName::Index(index), DiffContext::new(array1.get(index1), array2.get(index)));
            continue;
        }

        let moved = if options.arrays.detect_move {
            removed
                .iter()
                .position(|&index1| matcher.matches(trimmed1, trimmed2, index1 - common_head, index - common_head))
        } else {
            None
        };
        match moved {
            Some(position) => {
                let index1 = removed.remove(position);
                let value = options
                    .arrays
                    .include_value_on_move
                    .then(|| options.embed(&array1[index1]));
                entries.insert(ArrayKey::Left(index1), Delta::Moved { value, to: index });
                tree.push(id, ChildName::Index(index), DiffContext::new(array1.get(index1), array2.get(index)));
            }
            None => {
                entries.insert(ArrayKey::Right(index), Delta::Added(options.embed(&array2[index])));
            }
        }
    }

    tree.get_mut(id).set_result(Some(Delta::Array(entries)));
    tree.exit(id);
    Ok(())
}

/// Removals and moves first, from the highest index down; then insertions
/// from the lowest index up; nested changes last, through child contexts.
pub fn patch_filter(tree: &mut ContextTree<PatchContext<'_>>, id: NodeId, _: &Options) -> Result<(), DeltaError> {
    let ctx = tree.get_mut(id);
    let delta = ctx.delta;
    let Delta::Array(entries) = delta else {
        return Ok(());
    };
    let mut array = match ctx.left.take() {
        Some(Value::Array(array)) => array,
        other => return Err(DeltaError::type_mismatch(delta.kind(), other.as_ref())),
    };

    let mut to_remove = Vec::new();
    let mut to_insert = Vec::new();
    let mut to_modify = Vec::new();
    for (key, entry) in entries {
        match (*key, entry) {
            (ArrayKey::Left(index), Delta::Deleted(_) | Delta::Moved { .. }) => to_remove.push((index, entry)),
            (ArrayKey::Left(index), other) => {
                return Err(DeltaError::InvalidArrayPatch {
                    index,
                    found: other.kind(),
                });
            }
            (ArrayKey::Right(index), Delta::Added(value)) => to_insert.push((index, value.clone())),
            (ArrayKey::Right(index), other) => to_modify.push((index, other)),
        }
    }

    for (index, entry) in to_remove.into_iter().rev() {
        if index >= array.len() {
            return Err(DeltaError::index_out_of_bounds(index, array.len()));
        }
        let removed = array.remove(index);
        if let Delta::Moved { to, .. } = entry {
            to_insert.push((*to, removed));
        }
    }

    to_insert.sort_by_key(|(index, _)| *index);
    for (index, value) in to_insert {
        if index > array.len() {
            return Err(DeltaError::index_out_of_bounds(index, array.len()));
        }
        array.insert(index, value);
    }

    let mut children = Vec::with_capacity(to_modify.len());
    for (index, child) in to_modify {
        let len = array.len();
        let slot = array
            .get_mut(index)
            .ok_or_else(|| DeltaError::index_out_of_bounds(index, len))?;
        children.push((index, std::mem::take(slot), child));
    }

    let ctx = tree.get_mut(id);
    if children.is_empty() {
        ctx.set_result(Some(Value::Array(array)));
        tree.exit(id);
        return Ok(());
    }
    ctx.left = Some(Value::Array(array));
    for (index, value, child) in children {
        tree.push(id, ChildName::Index(index), PatchContext::new(Some(value), child));
    }
    tree.exit(id);
    Ok(())
}

/// Write the patched elements back into their slots.
pub fn collect_children_patch_filter(
    tree: &mut ContextTree<PatchContext<'_>>,
    id: NodeId,
    _: &Options,
) -> Result<(), DeltaError> {
    let delta = tree.get(id).delta;
    if !tree.has_children(id) || !matches!(delta, Delta::Array(_)) {
        return Ok(());
    }
    let mut array = match tree.get_mut(id).left.take() {
        Some(Value::Array(array)) => array,
        other => return Err(DeltaError::type_mismatch(delta.kind(), other.as_ref())),
    };
    for child in tree.children(id).to_vec() {
        let value = tree.get_mut(child).take_result().unwrap_or(Value::Null);
        if let Some(ChildName::Index(index)) = tree.child_name(child) {
            if let Some(slot) = array.get_mut(*index) {
                *slot = value;
            }
        }
    }
    tree.get_mut(id).set_result(Some(Value::Array(array)));
    tree.exit(id);
    Ok(())
}

/// A move swaps its source and target; an array delta reverses entry by
/// entry, and the entries are re-keyed once they are collected.
pub fn reverse_filter(tree: &mut ContextTree<ReverseContext<'_>>, id: NodeId, _: &Options) -> Result<(), DeltaError> {
    let delta = tree.get(id).delta;
    match delta {
        Delta::Moved { value, to } => {
            let Some(ChildName::Array(ArrayKey::Left(from))) = tree.child_name(id) else {
                return Err(DeltaError::invalid_delta(
                    "array moves must be keyed by their original index",
                ));
            };
            let from = *from;
            let ctx = tree.get_mut(id);
            ctx.new_name = Some(ArrayKey::Left(*to));
            ctx.set_result(Delta::Moved {
                value: value.clone(),
                to: from,
            });
            tree.exit(id);
        }
        Delta::Array(entries) if entries.is_empty() => {
            tree.get_mut(id).set_result(Delta::Array(BTreeMap::new()));
            tree.exit(id);
        }
        Delta::Array(entries) => {
            for (key, child) in entries {
                tree.push(id, ChildName::Array(*key), ReverseContext::new(child));
            }
            tree.exit(id);
        }
        _ => {}
    }
    Ok(())
}

pub fn collect_children_reverse_filter(
    tree: &mut ContextTree<ReverseContext<'_>>,
    id: NodeId,
    _: &Options,
) -> Result<(), DeltaError> {
    let delta = tree.get(id).delta;
    let Delta::Array(entries) = delta else {
        return Ok(());
    };
    if !tree.has_children(id) {
        return Ok(());
    }

    let mut reversed = BTreeMap::new();
    for child in tree.children(id).to_vec() {
        let Some(result) = tree.get_mut(child).take_result() else {
            continue;
        };
        let key = match (tree.get(child).new_name, tree.child_name(child)) {
            (Some(key), _) => key,
            (None, Some(ChildName::Array(key))) => reverse_array_delta_index(entries, *key, &result),
            (None, name) => {
                return Err(DeltaError::invalid_delta(format!(
                    "unexpected array delta child {name:?}"
                )));
            }
        };
        reversed.insert(key, result);
    }
    tree.get_mut(id).set_result(Delta::Array(reversed));
    tree.exit(id);
    Ok(())
}

/// Key that the reversed form of the entry at `key` takes.
///
/// `reversed` is the already reversed entry. An element that stays in the
/// array is keyed by its position on the left: the right position minus the
/// insertions before it, counted back over the left positions that survive
/// the removals.
pub fn reverse_array_delta_index(entries: &BTreeMap<ArrayKey, Delta>, key: ArrayKey, reversed: &Delta) -> ArrayKey {
    let index = match key {
        ArrayKey::Left(index) => return ArrayKey::Right(index),
        ArrayKey::Right(index) => index,
    };
    if matches!(reversed, Delta::Deleted(_)) {
        return ArrayKey::Left(index);
    }

    let mut removed = Vec::new();
    let mut inserted = 0;
    for (key, entry) in entries {
        match (key, entry) {
            (ArrayKey::Left(from), Delta::Moved { to, .. }) => {
                if *to == index {
                    return ArrayKey::Right(*from);
                }
                removed.push(*from);
                if *to < index {
                    inserted += 1;
                }
            }
            (ArrayKey::Left(from), _) => removed.push(*from),
            (ArrayKey::Right(added), Delta::Added(_)) if *added < index => inserted += 1,
            _ => {}
        }
    }

    let mut rank = index.saturating_sub(inserted);
    let mut left = 0;
    loop {
        if !removed.contains(&left) {
            if rank == 0 {
                return ArrayKey::Right(left);
            }
            rank -= 1;
        }
        left += 1;
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use serde_json::json;

    use super::*;

    fn options_by_id() -> Options {
        Options::default().with_object_hash_key("id")
    }

    #[test]
    fn match_by_ref_ignores_same_position() {
        check!(!arrays_have_match_by_ref(&[json!(1), json!(2)], &[json!(1), json!(3)]));
        check!(arrays_have_match_by_ref(&[json!(1), json!(2)], &[json!(2), json!(3)]));
        check!(!arrays_have_match_by_ref(&[json!({"a": 1})], &[json!(0), json!({"a": 1})]));
    }

    #[test]
    fn objects_match_by_position_without_shared_elements() {
        let array1 = [json!({"a": 1}), json!({"a": 2})];
        let array2 = [json!({"a": 9}), json!({"a": 2})];
        let options = Options::default();
        let mut matcher = Matcher::new(&options, &array1, &array2);
        check!(matcher.match_by_position);
        check!(matcher.matches(&array1, &array2, 0, 0));
        check!(!matcher.matches(&array1, &array2, 0, 1));
    }

    #[test]
    fn shared_primitives_disable_positional_matching() {
        let array1 = [json!(1), json!({"a": 1})];
        let array2 = [json!({"a": 2}), json!(1)];
        let options = Options::default();
        let mut matcher = Matcher::new(&options, &array1, &array2);
        check!(!matcher.match_by_position);
        check!(!matcher.matches(&array1, &array2, 1, 0));

        let options = Options::default().match_by_position(true);
        check!(Matcher::new(&options, &array1, &array2).match_by_position);
    }

    #[test]
    fn hashes_decide_identity_and_are_cached() {
        let array1 = [json!({"id": 1, "v": "a"}), json!({"v": "no id"})];
        let array2 = [json!({"id": 2}), json!({"id": 1, "v": "b"})];
        let options = options_by_id();
        let mut matcher = Matcher::new(&options, &array1, &array2);
        check!(matcher.matches(&array1, &array2, 0, 1));
        check!(!matcher.matches(&array1, &array2, 0, 0));
        check!(!matcher.matches(&array1, &array2, 1, 0));
        check!(matcher.hashes1.len() == 2);
        check!(matcher.hashes1.get(&1) == Some(&None));
    }

    #[test]
    fn primitives_never_match_by_hash() {
        let array1 = [json!(1)];
        let array2 = [json!("1")];
        let options = Options::default().with_object_hash(|value, _| Some(value.to_string().replace('"', "")));
        let mut matcher = Matcher::new(&options, &array1, &array2);
        check!(!matcher.matches(&array1, &array2, 0, 0));
    }

    fn reverse_index(entries: &Delta, key: ArrayKey, reversed: Delta) -> ArrayKey {
        let_assert!(Delta::Array(entries) = entries);
        reverse_array_delta_index(entries, key, &reversed)
    }

    #[test]
    fn reverse_index_accounts_for_shifts() {
        // [a, b, c, d] -> [b, x, c, d*]: "a" removed, "x" added, "d" modified.
        let delta = Delta::Array(BTreeMap::from([
            (ArrayKey::Left(0), Delta::Deleted(json!("a"))),
            (ArrayKey::Right(1), Delta::Added(json!("x"))),
            (ArrayKey::Right(3), Delta::Modified(json!("d"), json!("d*"))),
        ]));
        let modified = Delta::Modified(json!("d*"), json!("d"));
        check!(reverse_index(&delta, ArrayKey::Right(3), modified) == ArrayKey::Right(3));
        check!(reverse_index(&delta, ArrayKey::Left(0), Delta::Added(json!("a"))) == ArrayKey::Right(0));
        check!(reverse_index(&delta, ArrayKey::Right(1), Delta::Deleted(json!("x"))) == ArrayKey::Left(1));
    }

    #[test]
    fn reverse_index_follows_moves() {
        // [a, b, c] -> [c, a, b*]: "c" moved to 0, "b" modified at 2.
        let delta = Delta::Array(BTreeMap::from([
            (ArrayKey::Left(2), Delta::Moved { value: None, to: 0 }),
            (ArrayKey::Right(0), Delta::Object(BTreeMap::new())),
            (ArrayKey::Right(2), Delta::Modified(json!("b"), json!("b*"))),
        ]));
        let modified = Delta::Modified(json!("b*"), json!("b"));
        check!(reverse_index(&delta, ArrayKey::Right(2), modified) == ArrayKey::Right(1));
        check!(reverse_index(&delta, ArrayKey::Right(0), Delta::Object(BTreeMap::new())) == ArrayKey::Right(2));
    }

    #[test]
    fn reverse_index_skips_removed_positions() {
        // [a, b, c, d] -> [b, d*, x]
        let delta = Delta::Array(BTreeMap::from([
            (ArrayKey::Left(0), Delta::Deleted(json!("a"))),
            (ArrayKey::Left(2), Delta::Deleted(json!("c"))),
            (ArrayKey::Right(1), Delta::Modified(json!("d"), json!("d*"))),
            (ArrayKey::Right(2), Delta::Added(json!("x"))),
        ]));
        let modified = Delta::Modified(json!("d*"), json!("d"));
        check!(reverse_index(&delta, ArrayKey::Right(1), modified) == ArrayKey::Right(3));
    }
}
