//! Cases decided without looking inside the values.

use serde_json::Value;

use super::strict_eq;
use crate::{
    context::{DiffContext, PatchContext, ReverseContext},
    delta::Delta,
    error::DeltaError,
    options::Options,
    pipeline::{ContextTree, NodeId},
};

/// Equal values, a missing side, or values of different kinds. Booleans and
/// numbers are always settled here.
pub fn diff_filter(tree: &mut ContextTree<DiffContext<'_>>, id: NodeId, options: &Options) -> Result<(), DeltaError> {
    let ctx = tree.get_mut(id);
    let result = match (ctx.left, ctx.right) {
        (Some(left), Some(right)) if strict_eq(left, right) => None,
        (None, None) => None,
        (None, Some(right)) => Some(Delta::Added(options.embed(right))),
        (Some(left), None) => Some(Delta::Deleted(options.embed(left))),
        (Some(left), Some(right)) => {
            let replace = std::mem::discriminant(left) != std::mem::discriminant(right)
                || matches!(left, Value::Bool(_) | Value::Number(_));
            if !replace {
                return Ok(());
            }
            Some(Delta::Modified(options.embed(left), options.embed(right)))
        }
    };
    ctx.set_result(result);
    tree.exit(id);
    Ok(())
}

/// Leaf deltas that carry the new value.
pub fn patch_filter(tree: &mut ContextTree<PatchContext<'_>>, id: NodeId, _: &Options) -> Result<(), DeltaError> {
    let ctx = tree.get_mut(id);
    let result = match ctx.delta {
        Delta::Added(value) => Some(value.clone()),
        Delta::Modified(_, new) => Some(new.clone()),
        Delta::Deleted(_) => None,
        Delta::Moved { .. } => {
            return Err(DeltaError::invalid_delta(
                "array moves can only be applied from an array delta",
            ));
        }
        Delta::TextDiff(_) | Delta::Object(_) | Delta::Array(_) => return Ok(()),
    };
    ctx.set_result(result);
    tree.exit(id);
    Ok(())
}

pub fn reverse_filter(tree: &mut ContextTree<ReverseContext<'_>>, id: NodeId, _: &Options) -> Result<(), DeltaError> {
    let ctx = tree.get_mut(id);
    let result = match ctx.delta {
        Delta::Added(value) => Delta::Deleted(value.clone()),
        Delta::Modified(old, new) => Delta::Modified(new.clone(), old.clone()),
        Delta::Deleted(value) => Delta::Added(value.clone()),
        _ => return Ok(()),
    };
    ctx.set_result(result);
    tree.exit(id);
    Ok(())
}
