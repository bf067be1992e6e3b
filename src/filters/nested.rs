//! Objects, member by member, and the collection of child results shared by
//! object and array nodes.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::trace;

use crate::{
    context::{ChildName, DiffContext, PatchContext, ReverseContext},
    delta::{ArrayKey, Delta},
    error::DeltaError,
    options::Options,
    pipeline::{ContextTree, NodeId},
};

/// Fold the children's deltas into the node's own result. Array nodes may
/// already hold entries for removed, added and moved elements.
pub fn collect_children_diff_filter(
    tree: &mut ContextTree<DiffContext<'_>>,
    id: NodeId,
    _: &Options,
) -> Result<(), DeltaError> {
    if !tree.has_children(id) {
        return Ok(());
    }
    let is_array = tree.get(id).left_is_array();
    let mut result = tree.get_mut(id).take_result();
    for child in tree.children(id).to_vec() {
        let Some(delta) = tree.get_mut(child).take_result() else {
            continue;
        };
        let node = result.get_or_insert_with(|| {
            if is_array {
                Delta::Array(BTreeMap::new())
            } else {
                Delta::Object(BTreeMap::new())
            }
        });
        match (node, tree.child_name(child)) {
            (Delta::Array(entries), Some(ChildName::Index(index))) => {
                entries.insert(ArrayKey::Right(*index), delta);
            }
            (Delta::Object(members), Some(ChildName::Key(key))) => {
                members.insert(key.clone(), delta);
            }
            (node, name) => {
                return Err(DeltaError::invalid_delta(format!(
                    "child {} does not belong in {} delta",
                    name.map_or_else(|| "<root>".to_string(), ToString::to_string),
                    node.kind()
                )));
            }
        }
    }

    let result = result.filter(|delta| match delta {
        Delta::Object(members) => !members.is_empty(),
        Delta::Array(entries) => !entries.is_empty(),
        _ => true,
    });
    tree.get_mut(id).set_result(result);
    tree.exit(id);
    Ok(())
}

/// Queue one child per member present on either side.
pub fn diff_filter(tree: &mut ContextTree<DiffContext<'_>>, id: NodeId, options: &Options) -> Result<(), DeltaError> {
    let ctx = tree.get(id);
    let (Some(Value::Object(left)), Some(Value::Object(right))) = (ctx.left, ctx.right) else {
        return Ok(());
    };
    let included = |name: &str| {
        options
            .property_filter
            .as_ref()
            .is_none_or(|filter| filter(name, ctx))
    };

    let mut members = Vec::new();
    for (name, value) in left {
        if included(name) {
            members.push((name, Some(value), right.get(name)));
        }
    }
    for (name, value) in right {
        if !left.contains_key(name) && included(name) {
            members.push((name, None, Some(value)));
        }
    }

    if members.is_empty() {
        tree.get_mut(id).set_result(None);
        tree.exit(id);
        return Ok(());
    }
    for (name, left, right) in members {
        tree.push(id, ChildName::key(name.clone()), DiffContext::new(left, right));
    }
    tree.exit(id);
    Ok(())
}

/// Hand each member named by an object delta to a child context.
pub fn patch_filter(tree: &mut ContextTree<PatchContext<'_>>, id: NodeId, _: &Options) -> Result<(), DeltaError> {
    let ctx = tree.get_mut(id);
    let delta = ctx.delta;
    let Delta::Object(members) = delta else {
        return Ok(());
    };
    let mut target = take_object(ctx, delta)?;

    if members.is_empty() {
        ctx.set_result(Some(Value::Object(target)));
        tree.exit(id);
        return Ok(());
    }
    let children: Vec<_> = members
        .iter()
        .map(|(name, child)| (name, target.remove(name), child))
        .collect();
    ctx.left = Some(Value::Object(target));

    trace!(members = children.len(), "patching object");
    for (name, value, child) in children {
        tree.push(id, ChildName::key(name.clone()), PatchContext::new(value, child));
    }
    tree.exit(id);
    Ok(())
}

/// Put the patched members back; members whose patch removed them stay out.
pub fn collect_children_patch_filter(
    tree: &mut ContextTree<PatchContext<'_>>,
    id: NodeId,
    _: &Options,
) -> Result<(), DeltaError> {
    if !tree.has_children(id) {
        return Ok(());
    }
    let delta = tree.get(id).delta;
    if !matches!(delta, Delta::Object(_)) {
        return Ok(());
    }
    let mut target = take_object(tree.get_mut(id), delta)?;
    for child in tree.children(id).to_vec() {
        let value = tree.get_mut(child).take_result();
        if let (Some(ChildName::Key(name)), Some(value)) = (tree.child_name(child), value) {
            target.insert(name.clone(), value);
        }
    }
    tree.get_mut(id).set_result(Some(Value::Object(target)));
    tree.exit(id);
    Ok(())
}

fn take_object(ctx: &mut PatchContext<'_>, delta: &Delta) -> Result<Map<String, Value>, DeltaError> {
    match ctx.left.take() {
        Some(Value::Object(map)) => Ok(map),
        other => Err(DeltaError::type_mismatch(delta.kind(), other.as_ref())),
    }
}

pub fn reverse_filter(tree: &mut ContextTree<ReverseContext<'_>>, id: NodeId, _: &Options) -> Result<(), DeltaError> {
    let delta = tree.get(id).delta;
    let Delta::Object(members) = delta else {
        return Ok(());
    };
    if members.is_empty() {
        tree.get_mut(id).set_result(Delta::Object(BTreeMap::new()));
        tree.exit(id);
        return Ok(());
    }
    for (name, child) in members {
        tree.push(id, ChildName::key(name.clone()), ReverseContext::new(child));
    }
    tree.exit(id);
    Ok(())
}

pub fn collect_children_reverse_filter(
    tree: &mut ContextTree<ReverseContext<'_>>,
    id: NodeId,
    _: &Options,
) -> Result<(), DeltaError> {
    if !tree.has_children(id) || !matches!(tree.get(id).delta, Delta::Object(_)) {
        return Ok(());
    }
    let mut members = BTreeMap::new();
    for child in tree.children(id).to_vec() {
        let result = tree.get_mut(child).take_result();
        if let (Some(ChildName::Key(name)), Some(result)) = (tree.child_name(child), result) {
            members.insert(name.clone(), result);
        }
    }
    tree.get_mut(id).set_result(Delta::Object(members));
    tree.exit(id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use serde_json::json;

    use super::*;

    #[test]
    fn queues_members_from_both_sides() {
        let left = json!({"a": 1, "b": 2});
        let right = json!({"b": 3, "c": 4});
        let mut tree = ContextTree::new(DiffContext::new(Some(&left), Some(&right)));
        let root = tree.root();
        let_assert!(Ok(()) = diff_filter(&mut tree, root, &Options::default()));

        let names: Vec<String> = tree
            .children(root)
            .iter()
            .filter_map(|&child| tree.child_name(child).map(ToString::to_string))
            .collect();
        check!(names == vec!["a", "b", "c"]);
        let c = tree.children(root)[2];
        check!(tree.get(c).left.is_none());
        check!(tree.get(c).right == Some(&json!(4)));
    }

    #[test]
    fn property_filter_skips_members() {
        let left = json!({"a": 1, "secret": 2});
        let right = json!({"a": 1, "secret": 3});
        let options = Options::default().with_property_filter(|name, _| name != "secret");
        let mut tree = ContextTree::new(DiffContext::new(Some(&left), Some(&right)));
        let root = tree.root();
        let_assert!(Ok(()) = diff_filter(&mut tree, root, &options));
        check!(tree.children(root).len() == 1);
    }

    #[test]
    fn empty_objects_have_no_delta() {
        let (left, right) = (json!({}), json!({}));
        let mut tree = ContextTree::new(DiffContext::new(Some(&left), Some(&right)));
        let root = tree.root();
        let_assert!(Ok(()) = diff_filter(&mut tree, root, &Options::default()));
        check!(!tree.has_children(root));
        let ctx = tree.into_root();
        check!(crate::context::Context::has_result(&ctx));
        check!(ctx.result().is_none());
    }

    #[test]
    fn patch_rejects_non_objects() {
        let delta = Delta::Object(BTreeMap::from([("a".to_string(), Delta::Added(json!(1)))]));
        let mut tree = ContextTree::new(PatchContext::new(Some(json!([1])), &delta));
        let root = tree.root();
        let_assert!(
            Err(DeltaError::TypeMismatch { delta: "object", target: "an array" }) =
                patch_filter(&mut tree, root, &Options::default())
        );
    }
}
