use serde::{Deserialize, Serialize};

use crate::error::InvalidRuleError;
use crate::plan::{RelocationPlan, build_plan};
use crate::rule::RelocationRule;

/// Loaded from `.shadowpack/config.json`, holds the relocation rules and packaging options.
///
/// Rules are applied in the order they are listed: relocate the project's own
/// package first, then the libraries that move into it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Ordered relocation rules
    #[serde(default)]
    pub relocations: Vec<RelocationRule>,

    /// Glob patterns for entries dropped from the output (e.g. "META-INF/*.SF")
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,

    /// Annotation descriptors the bad-call scan looks for
    #[serde(default)]
    pub bad_annotations: Vec<String>,

    /// Treat plan warnings as errors
    #[serde(default)]
    pub strict: bool,
}

fn default_ignore() -> Vec<String> {
    ["META-INF/*.SF", "META-INF/*.DSA", "META-INF/*.RSA"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            relocations: Vec::new(),
            ignore: default_ignore(),
            bad_annotations: Vec::new(),
            strict: false,
        }
    }
}

impl Config {
    /// # Errors
    /// Returns error if any relocation rule is invalid.
    pub fn build_plan(&self) -> Result<RelocationPlan, InvalidRuleError> {
        build_plan(self.relocations.iter().cloned())
    }
}
