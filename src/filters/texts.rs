//! Long strings are stored as character-level patches instead of whole
//! replacements.

use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    context::{DiffContext, PatchContext, ReverseContext},
    delta::Delta,
    error::DeltaError,
    options::Options,
    pipeline::{ContextTree, NodeId},
    text::{PatchInput, TextError, parse_hunk_header},
};

pub fn diff_filter(tree: &mut ContextTree<DiffContext<'_>>, id: NodeId, options: &Options) -> Result<(), DeltaError> {
    let ctx = tree.get_mut(id);
    let (Some(Value::String(left)), Some(Value::String(right))) = (ctx.left, ctx.right) else {
        return Ok(());
    };
    let min_length = options.text_diff.min_length;
    let (left_len, right_len) = (left.chars().count(), right.chars().count());

    let delta = if left_len < min_length || right_len < min_length {
        Delta::Modified(Value::String(left.clone()), Value::String(right.clone()))
    } else {
        debug!(left_len, right_len, "diffing text");
        let engine = &options.text_diff.engine;
        let patches = engine.patch_make(PatchInput::Texts(left, right));
        Delta::TextDiff(engine.patch_to_text(&patches))
    };
    ctx.set_result(Some(delta));
    tree.exit(id);
    Ok(())
}

/// Hunks that no longer fit the text are skipped and logged; the rest of
/// the patch still applies.
pub fn patch_filter(tree: &mut ContextTree<PatchContext<'_>>, id: NodeId, options: &Options) -> Result<(), DeltaError> {
    let ctx = tree.get_mut(id);
    let delta = ctx.delta;
    let Delta::TextDiff(patch) = delta else {
        return Ok(());
    };
    let Some(Value::String(text)) = &ctx.left else {
        return Err(DeltaError::type_mismatch(delta.kind(), ctx.left.as_ref()));
    };

    let engine = &options.text_diff.engine;
    let patches = engine.patch_from_text(patch)?;
    let (patched, results) = engine.patch_apply(&patches, text)?;
    let failed: Vec<usize> = results
        .iter()
        .enumerate()
        .filter_map(|(index, applied)| (!applied).then_some(index))
        .collect();
    if !failed.is_empty() {
        warn!(?failed, hunks = results.len(), "text patch applied partially");
    }
    ctx.set_result(Some(Value::String(patched)));
    tree.exit(id);
    Ok(())
}

pub fn reverse_filter(tree: &mut ContextTree<ReverseContext<'_>>, id: NodeId, _: &Options) -> Result<(), DeltaError> {
    let ctx = tree.get_mut(id);
    let Delta::TextDiff(patch) = ctx.delta else {
        return Ok(());
    };
    let reversed = reverse_text_delta(patch)?;
    ctx.set_result(Delta::TextDiff(reversed));
    tree.exit(id);
    Ok(())
}

/// Turn a patch from `a` to `b` into a patch from `b` to `a` by rewriting
/// its text: hunk ranges trade places and `+`/`-` lines trade prefixes.
///
/// Within a run of changes the deletions are kept ahead of the insertions.
pub fn reverse_text_delta(patch: &str) -> Result<String, TextError> {
    let mut lines: Vec<String> = patch.split('\n').map(str::to_string).collect();
    for index in 0..lines.len() {
        let line = &lines[index];
        if line.starts_with('@') {
            let header = parse_hunk_header(line)?.swapped().to_string();
            lines[index] = header;
        } else if let Some(inserted) = line.strip_prefix('+') {
            let deleted = format!("-{inserted}");
            lines[index] = deleted;
            if index > 0 && lines[index - 1].starts_with('+') {
                lines.swap(index - 1, index);
            }
        } else if let Some(deleted) = line.strip_prefix('-') {
            let inserted = format!("+{deleted}");
            lines[index] = inserted;
        }
    }
    Ok(lines.join("\n"))
}
