use serde::{Deserialize, Serialize};

use crate::error::{InvalidRuleError, RuleField};

/// One `fromPackage -> toPackage` rename with its own exclusion patterns.
///
/// Exclusions are scoped to this rule only. A path excluded here can still be
/// rewritten by a later rule in the same plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelocationRule {
    /// Dotted package prefix to move (e.g. "org.bukkit.craftbukkit")
    pub from_package: String,
    /// Dotted package prefix to move it to
    pub to_package: String,
    /// Glob patterns over class/resource names, dotted or slashed
    #[serde(default)]
    pub excludes: Vec<String>,
}

impl RelocationRule {
    pub fn new(from_package: impl Into<String>, to_package: impl Into<String>) -> Self {
        Self {
            from_package: from_package.into(),
            to_package: to_package.into(),
            excludes: Vec::new(),
        }
    }

    #[must_use]
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.excludes.push(pattern.into());
        self
    }

    /// # Errors
    /// Returns error if either package is empty or not a dotted identifier path.
    pub(crate) fn validate(&self, index: usize) -> Result<(), InvalidRuleError> {
        validate_package(index, RuleField::FromPackage, &self.from_package)?;
        validate_package(index, RuleField::ToPackage, &self.to_package)
    }
}

fn validate_package(index: usize, field: RuleField, value: &str) -> Result<(), InvalidRuleError> {
    if value.trim().is_empty() {
        return Err(InvalidRuleError::Empty { index, field });
    }
    if !value.split('.').all(is_java_identifier) {
        return Err(InvalidRuleError::MalformedPackage {
            index,
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

fn is_java_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_builder_keeps_exclude_order() {
        let rule = RelocationRule::new("a.b", "a.b.v1")
            .exclude("a.b.Main*")
            .exclude("a.b.Boot");
        assert_eq!(rule.excludes, vec!["a.b.Main*", "a.b.Boot"]);
    }

    #[rstest]
    #[case("org.bukkit.craftbukkit")]
    #[case("org.bukkit.craftbukkit.v1_19_R3")]
    #[case("a")]
    #[case("$internal._x")]
    fn test_valid_packages(#[case] package: &str) {
        assert!(RelocationRule::new(package, "x.y").validate(0).is_ok());
        assert!(RelocationRule::new("x.y", package).validate(0).is_ok());
    }

    #[rstest]
    #[case("a..b")]
    #[case(".a")]
    #[case("a.")]
    #[case("a/b")]
    #[case("1a.b")]
    #[case("a.b-c")]
    fn test_malformed_packages(#[case] package: &str) {
        let err = RelocationRule::new("x.y", package).validate(3).unwrap_err();
        assert!(matches!(
            err,
            InvalidRuleError::MalformedPackage {
                index: 3,
                field: RuleField::ToPackage,
                ..
            }
        ));
    }

    #[test]
    fn test_empty_from_package() {
        let err = RelocationRule::new("  ", "x.y").validate(0).unwrap_err();
        assert_eq!(
            err,
            InvalidRuleError::Empty {
                index: 0,
                field: RuleField::FromPackage
            }
        );
    }

    #[test]
    fn test_deserialize_camel_case() {
        let rule: RelocationRule = serde_json::from_str(
            r#"{"fromPackage": "a.b", "toPackage": "c.d", "excludes": ["a.b.Main*"]}"#,
        )
        .unwrap();
        assert_eq!(rule, RelocationRule::new("a.b", "c.d").exclude("a.b.Main*"));
    }

    #[test]
    fn test_deserialize_without_excludes() {
        let rule: RelocationRule =
            serde_json::from_str(r#"{"fromPackage": "a.b", "toPackage": "c.d"}"#).unwrap();
        assert!(rule.excludes.is_empty());
    }
}
