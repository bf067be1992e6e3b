use super::Context;
use crate::delta::{ArrayKey, Delta};

#[derive(Debug, Clone)]
pub struct ReverseContext<'d> {
    pub delta: &'d Delta,
    result: Option<Delta>,
    /// Key the reversed entry takes in its parent array delta, when the
    /// filter already knows it.
    pub new_name: Option<ArrayKey>,
}

impl<'d> ReverseContext<'d> {
    pub fn new(delta: &'d Delta) -> Self {
        ReverseContext {
            delta,
            result: None,
            new_name: None,
        }
    }

    pub fn set_result(&mut self, delta: Delta) {
        self.result = Some(delta);
    }

    pub fn result(&self) -> Option<&Delta> {
        self.result.as_ref()
    }

    pub fn take_result(&mut self) -> Option<Delta> {
        self.result.take()
    }
}

impl Context for ReverseContext<'_> {
    const PIPE: &'static str = "reverse";

    fn has_result(&self) -> bool {
        self.result.is_some()
    }
}
