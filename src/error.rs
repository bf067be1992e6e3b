use crate::{pipeline::PipelineError, text::TextError};

#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum DeltaError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Text(#[from] TextError),

    #[error("Invalid delta: {reason}")]
    InvalidDelta { reason: String },

    #[error("Only removal or move can be applied at original array index {index}, found {found}")]
    InvalidArrayPatch { index: usize, found: &'static str },

    #[error("Cannot apply {delta} delta to {target}")]
    TypeMismatch {
        delta: &'static str,
        target: &'static str,
    },

    #[error("Array index {index} is out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },
}

impl DeltaError {
    pub fn invalid_delta(reason: impl Into<String>) -> Self {
        DeltaError::InvalidDelta {
            reason: reason.into(),
        }
    }

    pub fn type_mismatch(delta: &'static str, target: Option<&serde_json::Value>) -> Self {
        DeltaError::TypeMismatch {
            delta,
            target: value_type_desc(target),
        }
    }

    pub fn index_out_of_bounds(index: usize, len: usize) -> Self {
        DeltaError::IndexOutOfBounds { index, len }
    }
}

/// Short JSON type name used in error messages.
pub(crate) fn value_type_desc(value: Option<&serde_json::Value>) -> &'static str {
    match value {
        None => "a missing value",
        Some(serde_json::Value::Null) => "null",
        Some(serde_json::Value::Bool(_)) => "a boolean",
        Some(serde_json::Value::Number(_)) => "a number",
        Some(serde_json::Value::String(_)) => "a string",
        Some(serde_json::Value::Array(_)) => "an array",
        Some(serde_json::Value::Object(_)) => "an object",
    }
}
