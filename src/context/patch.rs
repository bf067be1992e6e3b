use serde_json::Value;

use super::Context;
use crate::delta::Delta;

/// Application of `delta` to a value. The value is owned and modified in
/// place by the filters.
#[derive(Debug, Clone)]
pub struct PatchContext<'d> {
    pub left: Option<Value>,
    pub delta: &'d Delta,
    result: Option<Option<Value>>,
}

impl<'d> PatchContext<'d> {
    pub fn new(left: Option<Value>, delta: &'d Delta) -> Self {
        PatchContext {
            left,
            delta,
            result: None,
        }
    }

    /// `None` records that the value was removed.
    pub fn set_result(&mut self, value: Option<Value>) {
        self.result = Some(value);
    }

    pub fn take_result(&mut self) -> Option<Value> {
        self.result.take().flatten()
    }
}

impl Context for PatchContext<'_> {
    const PIPE: &'static str = "patch";

    fn has_result(&self) -> bool {
        self.result.is_some()
    }
}
