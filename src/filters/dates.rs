use chrono::{DateTime, FixedOffset};
use serde_json::Value;

use crate::{
    context::DiffContext,
    delta::Delta,
    error::DeltaError,
    options::Options,
    pipeline::{ContextTree, NodeId},
};

/// Parse `YYYY-MM-DDTHH:MM:SS[.fff](Z|±HH:MM)` timestamps.
pub fn parse_date(text: &str) -> Option<DateTime<FixedOffset>> {
    if text.len() < 20 || text.as_bytes().get(10) != Some(&b'T') {
        return None;
    }
    DateTime::parse_from_rfc3339(text).ok()
}

/// A timestamp is only unchanged when spelled the same way, so that
/// patching reproduces the right-hand string exactly. A timestamp paired
/// with any other string is replaced.
pub fn diff_filter(tree: &mut ContextTree<DiffContext<'_>>, id: NodeId, _: &Options) -> Result<(), DeltaError> {
    let ctx = tree.get_mut(id);
    let (Some(Value::String(left)), Some(Value::String(right))) = (ctx.left, ctx.right) else {
        return Ok(());
    };
    if parse_date(left).is_none() && parse_date(right).is_none() {
        return Ok(());
    }
    let result = (left != right).then(|| Delta::Modified(Value::String(left.clone()), Value::String(right.clone())));
    ctx.set_result(result);
    tree.exit(id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert2::check;
    use serde_json::json;

    use super::*;

    fn diff(left: Value, right: Value) -> Option<Option<Delta>> {
        let mut tree = ContextTree::new(DiffContext::new(Some(&left), Some(&right)));
        let root = tree.root();
        check!(diff_filter(&mut tree, root, &Options::default()).is_ok());
        let mut ctx = tree.into_root();
        crate::context::Context::has_result(&ctx).then(|| ctx.take_result())
    }

    #[test]
    fn recognises_timestamps() {
        check!(parse_date("2024-02-29T12:30:00Z").is_some());
        check!(parse_date("2024-02-29T12:30:00.123+02:00").is_some());
        check!(parse_date("2024-02-29 12:30:00Z").is_none());
        check!(parse_date("2024-02-29").is_none());
        check!(parse_date("2024-02-30T12:30:00Z").is_none());
        check!(parse_date("not a date but twenty chars").is_none());
    }

    #[test]
    fn same_spelling_is_unchanged() {
        check!(diff(json!("2024-01-01T10:00:00Z"), json!("2024-01-01T10:00:00Z")) == Some(None));
    }

    #[test]
    fn same_instant_spelled_differently_is_replaced() {
        let left = json!("2024-01-01T10:00:00Z");
        let right = json!("2024-01-01T12:00:00+02:00");
        check!(diff(left.clone(), right.clone()) == Some(Some(Delta::Modified(left, right))));
    }

    #[test]
    fn different_instants_are_replaced() {
        let left = json!("2024-01-01T10:00:00Z");
        let right = json!("2024-01-02T10:00:00Z");
        check!(diff(left.clone(), right.clone()) == Some(Some(Delta::Modified(left, right))));
        check!(
            diff(json!("2024-01-01T10:00:00Z"), json!("yesterday")).flatten()
                == Some(Delta::Modified(json!("2024-01-01T10:00:00Z"), json!("yesterday")))
        );
    }

    #[test]
    fn ordinary_strings_pass_through() {
        check!(diff(json!("a"), json!("b")) == None);
    }
}
