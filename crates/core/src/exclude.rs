use glob::{MatchOptions, Pattern};

use crate::error::InvalidRuleError;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Compiled exclusion patterns of a single rule, in path form.
#[derive(Debug, Clone, Default)]
pub(crate) struct Excludes {
    patterns: Vec<Pattern>,
}

impl Excludes {
    /// Dotted patterns are turned into path form; `pkg/*` also covers `pkg/**`.
    pub(crate) fn compile(index: usize, raw: &[String]) -> Result<Self, InvalidRuleError> {
        let mut patterns = Vec::with_capacity(raw.len());
        for pattern in raw {
            let normalized = pattern.replace('.', "/");
            let compiled = Pattern::new(&normalized).map_err(|e| InvalidRuleError::InvalidExclude {
                index,
                pattern: pattern.clone(),
                reason: e.msg.to_string(),
            })?;
            patterns.push(compiled);
            if let Some(package) = normalized.strip_suffix("/*") {
                let recursive = format!("{package}/**");
                if let Ok(compiled) = Pattern::new(&recursive) {
                    patterns.push(compiled);
                }
            }
        }
        Ok(Self { patterns })
    }

    pub(crate) fn matches(&self, path: &str) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        let name = path.strip_suffix(".class").unwrap_or(path);
        self.patterns
            .iter()
            .any(|pattern| pattern.matches_with(name, MATCH_OPTIONS))
    }
}
