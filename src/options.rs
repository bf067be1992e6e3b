use std::{fmt, path::Path, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{context::DiffContext, text::DiffMatchPatch};

/// Identity of an array element, used to pair up elements across positions.
///
/// Receives the element and its index; `None` means the element has no
/// identity and will not match anything by hash.
pub type ObjectHash = Arc<dyn Fn(&Value, Option<usize>) -> Option<String> + Send + Sync>;

/// Decides whether an object member takes part in the diff.
pub type PropertyFilter = Arc<dyn Fn(&str, &DiffContext<'_>) -> bool + Send + Sync>;

/// Transform applied to every value copied into a delta.
pub type ValueTransform = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

pub const DEFAULT_TEXT_MIN_LENGTH: usize = 60;

#[derive(Clone, Default)]
pub struct Options {
    pub object_hash: Option<ObjectHash>,
    /// Pair objects at equal positions when there is no `object_hash`.
    /// `None` lets every array diff decide for itself.
    pub match_by_position: Option<bool>,
    pub arrays: ArrayOptions,
    pub text_diff: TextDiffOptions,
    pub property_filter: Option<PropertyFilter>,
    pub clone_diff_values: Option<ValueTransform>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayOptions {
    pub detect_move: bool,
    pub include_value_on_move: bool,
}

impl Default for ArrayOptions {
    fn default() -> Self {
        ArrayOptions {
            detect_move: true,
            include_value_on_move: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextDiffOptions {
    /// Strings shorter than this (in chars) are replaced wholesale.
    pub min_length: usize,
    pub engine: DiffMatchPatch,
}

impl Default for TextDiffOptions {
    fn default() -> Self {
        TextDiffOptions {
            min_length: DEFAULT_TEXT_MIN_LENGTH,
            engine: DiffMatchPatch::default(),
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Options::default()
    }

    pub fn with_object_hash<F>(mut self, hash: F) -> Self
    where
        F: Fn(&Value, Option<usize>) -> Option<String> + Send + Sync + 'static,
    {
        self.object_hash = Some(Arc::new(hash));
        self
    }

    /// Hash array elements by one of their members.
    pub fn with_object_hash_key(self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.with_object_hash(move |item, _| member_hash(item, &key))
    }

    pub fn with_property_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&str, &DiffContext<'_>) -> bool + Send + Sync + 'static,
    {
        self.property_filter = Some(Arc::new(filter));
        self
    }

    pub fn with_clone_diff_values<F>(mut self, transform: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.clone_diff_values = Some(Arc::new(transform));
        self
    }

    pub fn match_by_position(mut self, enabled: bool) -> Self {
        self.match_by_position = Some(enabled);
        self
    }

    pub fn detect_move(mut self, enabled: bool) -> Self {
        self.arrays.detect_move = enabled;
        self
    }

    pub fn include_value_on_move(mut self, enabled: bool) -> Self {
        self.arrays.include_value_on_move = enabled;
        self
    }

    pub fn text_min_length(mut self, min_length: usize) -> Self {
        self.text_diff.min_length = min_length;
        self
    }

    pub fn text_engine(mut self, engine: DiffMatchPatch) -> Self {
        self.text_diff.engine = engine;
        self
    }

    /// Copy of `value` for embedding in a delta.
    pub(crate) fn embed(&self, value: &Value) -> Value {
        match &self.clone_diff_values {
            Some(transform) if value.is_object() || value.is_array() => transform(value),
            _ => value.clone(),
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("object_hash", &self.object_hash.as_ref().map(|_| "<fn>"))
            .field("match_by_position", &self.match_by_position)
            .field("arrays", &self.arrays)
            .field("text_diff", &self.text_diff)
            .field("property_filter", &self.property_filter.as_ref().map(|_| "<fn>"))
            .field("clone_diff_values", &self.clone_diff_values.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// The serialisable subset of [`Options`], as read from a config file.
///
/// ```json
/// {
///   "objectHash": "id",
///   "matchByPosition": false,
///   "arrays": { "detectMove": true, "includeValueOnMove": false },
///   "textDiff": { "minLength": 60 }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OptionsFile {
    /// Member name, or JSON pointer when it starts with `/`.
    pub object_hash: Option<String>,
    pub match_by_position: Option<bool>,
    pub arrays: ArrayOptionsFile,
    pub text_diff: TextDiffOptionsFile,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArrayOptionsFile {
    pub detect_move: Option<bool>,
    pub include_value_on_move: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextDiffOptionsFile {
    pub min_length: Option<usize>,
}

#[derive(Debug, thiserror::Error)]
pub enum OptionsError {
    #[error("Failed to read options file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid options file: {0}")]
    Parse(#[from] serde_json::Error),
}

impl OptionsFile {
    pub fn load(path: &Path) -> Result<Self, OptionsError> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}

impl From<OptionsFile> for Options {
    fn from(file: OptionsFile) -> Self {
        let mut options = Options::default();
        if let Some(key) = file.object_hash {
            options = options.with_object_hash_key(key);
        }
        options.match_by_position = file.match_by_position;
        if let Some(detect_move) = file.arrays.detect_move {
            options.arrays.detect_move = detect_move;
        }
        if let Some(include) = file.arrays.include_value_on_move {
            options.arrays.include_value_on_move = include;
        }
        if let Some(min_length) = file.text_diff.min_length {
            options.text_diff.min_length = min_length;
        }
        options
    }
}

fn member_hash(item: &Value, key: &str) -> Option<String> {
    let member = if key.starts_with('/') {
        item.pointer(key)
    } else {
        item.get(key)
    }?;
    match member {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}
