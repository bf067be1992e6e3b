//! Structural diff, patch and reverse for JSON documents.
//!
//! A [`Delta`] records what changed between two [`serde_json::Value`]s:
//! replaced leaves, added and removed members, array elements that were
//! inserted, removed or moved, and long strings as character-level patches.
//! Deltas serialize to the compact JSON format used by jsondiffpatch.
//!
//! ```
//! use serde_json::json;
//!
//! let left = json!({"name": "Ana", "langs": ["rust", "go", "c"]});
//! let right = json!({"name": "Ana", "langs": ["go", "c", "rust"], "active": true});
//!
//! let delta = deltapatch::diff(&left, &right).unwrap().unwrap();
//! assert_eq!(
//!     delta.to_value(),
//!     json!({"langs": {"_t": "a", "_0": ["", 2, 3]}, "active": [true]})
//! );
//! assert_eq!(deltapatch::patch(left.clone(), &delta).unwrap(), right);
//! assert_eq!(deltapatch::unpatch(right, &delta).unwrap(), left);
//! ```

use std::sync::OnceLock;

use serde_json::Value;

pub mod context;
pub mod delta;
pub mod diffpatcher;
pub mod error;
pub mod filters;
pub mod lcs;
pub mod options;
pub mod pipeline;
pub mod text;

#[cfg(test)]
mod test_util;

pub use delta::{ArrayKey, Delta};
pub use diffpatcher::DiffPatcher;
pub use error::DeltaError;
pub use options::{Options, OptionsError, OptionsFile};
pub use pipeline::{Pipe, PipelineError, Pipelines};

fn default_instance() -> &'static DiffPatcher {
    static INSTANCE: OnceLock<DiffPatcher> = OnceLock::new();
    INSTANCE.get_or_init(DiffPatcher::default)
}

/// Diff with default [`Options`]. See [`DiffPatcher::diff`].
pub fn diff(left: &Value, right: &Value) -> Result<Option<Delta>, DeltaError> {
    default_instance().diff(left, right)
}

pub fn patch(left: Value, delta: &Delta) -> Result<Value, DeltaError> {
    default_instance().patch(left, delta)
}

pub fn unpatch(right: Value, delta: &Delta) -> Result<Value, DeltaError> {
    default_instance().unpatch(right, delta)
}

pub fn reverse(delta: &Delta) -> Result<Delta, DeltaError> {
    default_instance().reverse(delta)
}

pub fn clone(value: &Value) -> Value {
    default_instance().clone_value(value)
}
