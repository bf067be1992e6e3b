use serde::Deserialize;
use serde_json::Value;

use crate::options::{Options, OptionsFile};

pub const SCENARIOS: &str = include_str!("scenarios.json");

/// A pair of documents and the delta expected between them.
#[derive(Debug, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    options: OptionsFile,
    pub left: Value,
    pub right: Value,
    /// `null` when the documents are equivalent.
    pub delta: Option<Value>,
}

impl Scenario {
    pub fn all() -> Vec<Scenario> {
        serde_json::from_str(SCENARIOS).expect("Failed to parse diff scenarios")
    }

    pub fn options(&self) -> Options {
        self.options.clone().into()
    }
}
