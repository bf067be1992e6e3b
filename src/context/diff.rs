use serde_json::Value;

use super::Context;
use crate::delta::Delta;

/// Comparison of one pair of values. Either side is `None` when the member
/// does not exist on that side.
#[derive(Debug, Clone)]
pub struct DiffContext<'a> {
    pub left: Option<&'a Value>,
    pub right: Option<&'a Value>,
    result: Option<Option<Delta>>,
}

impl<'a> DiffContext<'a> {
    pub fn new(left: Option<&'a Value>, right: Option<&'a Value>) -> Self {
        DiffContext {
            left,
            right,
            result: None,
        }
    }

    /// `None` records that the two values are the same.
    pub fn set_result(&mut self, delta: Option<Delta>) {
        self.result = Some(delta);
    }

    pub fn result(&self) -> Option<&Delta> {
        self.result.as_ref().and_then(Option::as_ref)
    }

    pub fn take_result(&mut self) -> Option<Delta> {
        self.result.take().flatten()
    }

    pub fn left_is_array(&self) -> bool {
        matches!(self.left, Some(Value::Array(_)))
    }
}

impl Context for DiffContext<'_> {
    const PIPE: &'static str = "diff";

    fn has_result(&self) -> bool {
        self.result.is_some()
    }
}
