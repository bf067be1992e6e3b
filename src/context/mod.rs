//! Per-node state carried through the diff, patch and reverse pipelines.

mod diff;
mod patch;
mod reverse;

use std::fmt;

pub use diff::DiffContext;
pub use patch::PatchContext;
pub use reverse::ReverseContext;

use crate::delta::ArrayKey;

/// State of one node while a pipeline runs over it.
pub trait Context {
    /// Pipe run on this kind of context unless a filter switches it.
    const PIPE: &'static str;

    /// Whether a filter has decided the outcome for this node. A decided
    /// outcome may still be "nothing" (no change, deleted value).
    fn has_result(&self) -> bool;
}

/// Where a child context sits in its parent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChildName {
    /// Object member.
    Key(String),
    /// Array position.
    Index(usize),
    /// Entry of an array delta.
    Array(ArrayKey),
}

impl ChildName {
    pub fn key(name: impl Into<String>) -> Self {
        ChildName::Key(name.into())
    }
}

impl fmt::Display for ChildName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChildName::Key(key) => write!(f, "{key}"),
            ChildName::Index(index) => write!(f, "{index}"),
            ChildName::Array(key) => write!(f, "{key}"),
        }
    }
}
