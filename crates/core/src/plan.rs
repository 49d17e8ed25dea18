use std::borrow::Cow;
use std::fmt::Display;

use serde::Serialize;

use crate::class_file;
use crate::entry::{ArchiveEntry, EntryKind, SERVICES_PREFIX, split_version_prefix};
use crate::error::{InvalidRuleError, RelocateError};
use crate::exclude::Excludes;
use crate::resource;
use crate::rule::RelocationRule;

#[derive(Debug, Clone)]
struct CompiledRule {
    rule: RelocationRule,
    from_path: String,
    to_path: String,
    excludes: Excludes,
}

impl CompiledRule {
    fn compile(index: usize, rule: RelocationRule) -> Result<Self, InvalidRuleError> {
        rule.validate(index)?;
        let excludes = Excludes::compile(index, &rule.excludes)?;
        Ok(Self {
            from_path: rule.from_package.replace('.', "/"),
            to_path: rule.to_package.replace('.', "/"),
            excludes,
            rule,
        })
    }
}

/// Validated, ordered relocation rules.
///
/// Rules run in the order they were given and each one sees the output of the
/// previous ones. Nothing here reorders them: put the project's own package
/// before any library that gets relocated into it. [`RelocationPlan::warnings`]
/// points out orderings where a later rule re-relocates an earlier rule's output.
///
/// The plan is immutable once built, so one instance can be shared across
/// threads relocating different entries of the same archive.
#[derive(Debug, Clone, Default)]
pub struct RelocationPlan {
    rules: Vec<CompiledRule>,
}

/// Validate `rules` and freeze them into a plan, keeping caller order.
///
/// # Errors
/// Returns [`InvalidRuleError`] for the first rule with an empty or malformed
/// package, or an exclude pattern that is not a valid glob.
pub fn build_plan(
    rules: impl IntoIterator<Item = RelocationRule>,
) -> Result<RelocationPlan, InvalidRuleError> {
    let rules = rules
        .into_iter()
        .enumerate()
        .map(|(index, rule)| CompiledRule::compile(index, rule))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(RelocationPlan { rules })
}

/// Lint result for rule orderings that are legal but worth a second look.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PlanWarning {
    /// `later.fromPackage` covers `earlier.toPackage`, so output of the earlier
    /// rule is relocated again.
    #[serde(rename_all = "camelCase")]
    RelocatesEarlierOutput {
        earlier: usize,
        later: usize,
        earlier_to: String,
        later_from: String,
    },
    /// `fromPackage == toPackage`.
    IdentityRule { index: usize },
}

impl Display for PlanWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RelocatesEarlierOutput {
                earlier,
                later,
                earlier_to,
                later_from,
            } => {
                write!(f, "rule #{later} ({later_from}) also relocates ")?;
                write!(f, "the output of rule #{earlier} ({earlier_to})")
            }
            Self::IdentityRule { index } => {
                write!(f, "rule #{index} relocates a package onto itself")
            }
        }
    }
}

/// `Some(rest)` when `path` is `prefix` itself or lies under it on a segment boundary.
fn strip_package_prefix<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = path.strip_prefix(prefix)?;
    (rest.is_empty() || rest.starts_with('/')).then_some(rest)
}

impl RelocationPlan {
    pub fn rules(&self) -> impl Iterator<Item = &RelocationRule> {
        self.rules.iter().map(|compiled| &compiled.rule)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    #[must_use]
    pub fn warnings(&self) -> Vec<PlanWarning> {
        let mut warnings = Vec::new();
        for (index, rule) in self.rules.iter().enumerate() {
            if rule.from_path == rule.to_path {
                warnings.push(PlanWarning::IdentityRule { index });
            }
        }
        for (earlier, first) in self.rules.iter().enumerate() {
            for (later, second) in self.rules.iter().enumerate().skip(earlier + 1) {
                if strip_package_prefix(&first.to_path, &second.from_path).is_some() {
                    warnings.push(PlanWarning::RelocatesEarlierOutput {
                        earlier,
                        later,
                        earlier_to: first.rule.to_package.clone(),
                        later_from: second.rule.from_package.clone(),
                    });
                }
            }
        }
        warnings
    }

    /// Run a `/`-separated path (entry path or internal class name) through every rule.
    pub fn relocate_path<'a>(&self, path: &'a str) -> Cow<'a, str> {
        let mut current = Cow::Borrowed(path);
        for rule in &self.rules {
            if rule.excludes.matches(&current) {
                continue;
            }
            if let Some(rest) = strip_package_prefix(&current, &rule.from_path) {
                let relocated = format!("{}{rest}", rule.to_path);
                current = Cow::Owned(relocated);
            }
        }
        current
    }

    /// Same as [`Self::relocate_path`] for a dotted name such as `org.bukkit.craftbukkit.Main`.
    pub fn relocate_class_name<'a>(&self, name: &'a str) -> Cow<'a, str> {
        if !name.contains('.') && !self.rules.iter().any(|r| r.from_path == name) {
            return Cow::Borrowed(name);
        }
        let path = name.replace('.', "/");
        match self.relocate_path(&path) {
            Cow::Borrowed(_) => Cow::Borrowed(name),
            Cow::Owned(relocated) => Cow::Owned(relocated.replace('/', ".")),
        }
    }

    fn relocate_entry_path<'a>(&self, entry: &'a ArchiveEntry) -> Cow<'a, str> {
        match entry.kind() {
            EntryKind::ServiceDescriptor => {
                let name = &entry.path[SERVICES_PREFIX.len()..];
                match self.relocate_class_name(name) {
                    Cow::Borrowed(_) => Cow::Borrowed(entry.path.as_str()),
                    Cow::Owned(name) => Cow::Owned(format!("{SERVICES_PREFIX}{name}")),
                }
            }
            EntryKind::Manifest => Cow::Borrowed(entry.path.as_str()),
            _ => {
                let (version_prefix, path) = split_version_prefix(&entry.path);
                match self.relocate_path(path) {
                    Cow::Borrowed(_) => Cow::Borrowed(entry.path.as_str()),
                    Cow::Owned(path) => Cow::Owned(format!("{version_prefix}{path}")),
                }
            }
        }
    }

    /// Relocate one entry, failing on class files that cannot be parsed.
    ///
    /// Entries no rule touches come back unchanged.
    ///
    /// # Errors
    /// Returns [`RelocateError`] if a class file is malformed or a rewritten
    /// constant no longer fits the class-file format.
    pub fn try_apply(&self, entry: ArchiveEntry) -> Result<ArchiveEntry, RelocateError> {
        if self.is_empty() {
            return Ok(entry);
        }
        let content = self.rewrite_content(&entry)?;
        let path = self.relocate_entry_path(&entry).into_owned();
        if path != entry.path {
            tracing::debug!(from = %entry.path, to = %path, "relocated entry");
        }
        Ok(ArchiveEntry {
            path,
            content: content.unwrap_or(entry.content),
        })
    }

    /// Relocate one entry. If its content cannot be rewritten, the original
    /// bytes are kept under the relocated path and a warning is logged.
    #[must_use]
    pub fn apply(&self, entry: ArchiveEntry) -> ArchiveEntry {
        if self.is_empty() {
            return entry;
        }
        let content = match self.rewrite_content(&entry) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("keeping original content: {e}");
                None
            }
        };
        let path = self.relocate_entry_path(&entry).into_owned();
        ArchiveEntry {
            path,
            content: content.unwrap_or(entry.content),
        }
    }

    /// `Ok(None)` when the content needs no change.
    fn rewrite_content(&self, entry: &ArchiveEntry) -> Result<Option<Vec<u8>>, RelocateError> {
        match entry.kind() {
            EntryKind::Class => class_file::relocate_class(self, &entry.content).map_err(|source| {
                RelocateError::ClassFormat {
                    path: entry.path.clone(),
                    source,
                }
            }),
            EntryKind::ServiceDescriptor => {
                Ok(resource::relocate_service_lines(self, &entry.content))
            }
            EntryKind::Manifest => Ok(resource::relocate_manifest(self, &entry.content)),
            EntryKind::Directory | EntryKind::Resource => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuleField;
    use rstest::rstest;

    fn chained_plan() -> RelocationPlan {
        build_plan([
            RelocationRule::new("a.b", "a.b.v1"),
            RelocationRule::new("x.y", "a.b.v1.shaded.x.y"),
        ])
        .unwrap()
    }

    fn relocate(plan: &RelocationPlan, path: &str) -> String {
        plan.apply(ArchiveEntry::new(path, b"data".to_vec())).path
    }

    #[test]
    fn test_build_plan_keeps_order() {
        let plan = chained_plan();
        let froms: Vec<_> = plan.rules().map(|r| r.from_package.as_str()).collect();
        assert_eq!(froms, vec!["a.b", "x.y"]);
        assert_eq!(plan.len(), 2);
    }

    #[test]
    fn test_build_plan_rejects_empty_to_package() {
        let err = build_plan([
            RelocationRule::new("a.b", "c.d"),
            RelocationRule::new("x.y", ""),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            InvalidRuleError::Empty {
                index: 1,
                field: RuleField::ToPackage
            }
        );
    }

    #[test]
    fn test_build_plan_rejects_bad_exclude() {
        let err = build_plan([RelocationRule::new("a.b", "c.d").exclude("a.[b")]).unwrap_err();
        assert!(matches!(err, InvalidRuleError::InvalidExclude { index: 0, .. }));
    }

    #[test]
    fn test_chained_relocation() {
        let plan = chained_plan();
        assert_eq!(relocate(&plan, "x/y/Z.class"), "a/b/v1/shaded/x/y/Z.class");
        assert_eq!(relocate(&plan, "a/b/W.class"), "a/b/v1/W.class");
    }

    #[test]
    fn test_reversed_order_double_relocates() {
        let plan = build_plan([
            RelocationRule::new("x.y", "a.b.v1.shaded.x.y"),
            RelocationRule::new("a.b", "a.b.v1"),
        ])
        .unwrap();
        assert_eq!(relocate(&plan, "x/y/Z.class"), "a/b/v1/v1/shaded/x/y/Z.class");
        assert_eq!(
            plan.warnings(),
            vec![PlanWarning::RelocatesEarlierOutput {
                earlier: 0,
                later: 1,
                earlier_to: "a.b.v1.shaded.x.y".to_string(),
                later_from: "a.b".to_string(),
            }]
        );
    }

    #[test]
    fn test_correct_order_has_no_warnings() {
        assert!(chained_plan().warnings().is_empty());
    }

    #[test]
    fn test_identity_rule_warning() {
        let plan = build_plan([RelocationRule::new("a.b", "a.b")]).unwrap();
        assert_eq!(plan.warnings(), vec![PlanWarning::IdentityRule { index: 0 }]);
        assert!(plan.warnings()[0].to_string().contains("onto itself"));
    }

    #[rstest]
    #[case("a/bc/D.class")]
    #[case("ab/C.class")]
    #[case("META-INF/LICENSE")]
    #[case("z/a/b/C.class")]
    fn test_unmatched_entries_pass_through(#[case] path: &str) {
        let plan = chained_plan();
        let entry = ArchiveEntry::new(path, b"\x00\x01payload".to_vec());
        assert_eq!(plan.apply(entry.clone()), entry);
    }

    #[test]
    fn test_prefix_matches_whole_segments_only() {
        let plan = build_plan([RelocationRule::new("a.b", "c")]).unwrap();
        assert_eq!(relocate(&plan, "a/b/C.class"), "c/C.class");
        assert_eq!(relocate(&plan, "a/bb/C.class"), "a/bb/C.class");
        assert_eq!(relocate(&plan, "a/b/"), "c/");
    }

    #[test]
    fn test_already_relocated_path_is_untouched() {
        let plan = build_plan([RelocationRule::new("a.b", "c.d")]).unwrap();
        let once = relocate(&plan, "a/b/W.class");
        assert_eq!(once, "c/d/W.class");
        assert_eq!(relocate(&plan, &once), once);
    }

    #[test]
    fn test_exclusion_skips_matching_rule() {
        let plan = build_plan([
            RelocationRule::new("org.bukkit.craftbukkit", "org.bukkit.craftbukkit.v1_19_R3")
                .exclude("org.bukkit.craftbukkit.Main*"),
        ])
        .unwrap();
        assert_eq!(
            relocate(&plan, "org/bukkit/craftbukkit/Main.class"),
            "org/bukkit/craftbukkit/Main.class"
        );
        assert_eq!(
            relocate(&plan, "org/bukkit/craftbukkit/Main$1.class"),
            "org/bukkit/craftbukkit/Main$1.class"
        );
        assert_eq!(
            relocate(&plan, "org/bukkit/craftbukkit/CraftServer.class"),
            "org/bukkit/craftbukkit/v1_19_R3/CraftServer.class"
        );
    }

    #[test]
    fn test_exclusion_is_scoped_to_its_rule() {
        let plan = build_plan([
            RelocationRule::new("a.b", "a.c").exclude("a.b.keep.*"),
            RelocationRule::new("a.b.keep", "z.keep"),
        ])
        .unwrap();
        assert_eq!(relocate(&plan, "a/b/keep/K.class"), "z/keep/K.class");
        assert_eq!(relocate(&plan, "a/b/Other.class"), "a/c/Other.class");
    }

    #[test]
    fn test_multi_release_entry() {
        let plan = build_plan([RelocationRule::new("a.b", "c.d")]).unwrap();
        assert_eq!(
            relocate(&plan, "META-INF/versions/11/a/b/C.class"),
            "META-INF/versions/11/c/d/C.class"
        );
    }

    #[test]
    fn test_relocate_class_name() {
        let plan = chained_plan();
        assert_eq!(plan.relocate_class_name("x.y.Z"), "a.b.v1.shaded.x.y.Z");
        assert_eq!(plan.relocate_class_name("a.b"), "a.b.v1");
        assert!(matches!(plan.relocate_class_name("q.r.S"), Cow::Borrowed(_)));
        assert!(matches!(plan.relocate_class_name("Plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_empty_plan_is_identity() {
        let plan = build_plan(Vec::new()).unwrap();
        assert!(plan.is_empty());
        let entry = ArchiveEntry::new("a/b/C.class", b"not a class".to_vec());
        assert_eq!(plan.try_apply(entry.clone()).unwrap(), entry);
    }

    #[test]
    fn test_try_apply_rejects_malformed_class() {
        let plan = chained_plan();
        let err = plan
            .try_apply(ArchiveEntry::new("a/b/C.class", b"junk".to_vec()))
            .unwrap_err();
        assert!(err.to_string().starts_with("a/b/C.class:"));
    }

    #[test]
    fn test_try_apply_rejects_constant_grown_past_limit() {
        use crate::class_file::testing::ClassBuilder;
        use crate::error::ClassFormatError;

        let plan = chained_plan();
        let name = format!("x/y/{}", "Z".repeat(65_530));
        let entry = ArchiveEntry::new("x/y/Z.class", ClassBuilder::new(&name).build());
        let err = plan.try_apply(entry).unwrap_err();
        assert_eq!(
            err,
            RelocateError::ClassFormat {
                path: "x/y/Z.class".to_string(),
                source: ClassFormatError::ConstantTooLong(name.len() + "a/b/v1/shaded/".len()),
            }
        );
    }

    #[test]
    fn test_apply_keeps_content_of_malformed_class() {
        let plan = chained_plan();
        let relocated = plan.apply(ArchiveEntry::new("a/b/C.class", b"junk".to_vec()));
        assert_eq!(relocated.path, "a/b/v1/C.class");
        assert_eq!(relocated.content, b"junk");
    }

    #[test]
    fn test_class_path_and_content_stay_consistent() {
        use crate::class_file::testing::ClassBuilder;

        let plan = chained_plan();
        let mut builder = ClassBuilder::new("x/y/Z");
        builder.class("a/b/W");
        let entry = ArchiveEntry::new("x/y/Z.class", builder.build());
        let relocated = plan.try_apply(entry).unwrap();
        assert_eq!(relocated.path, "a/b/v1/shaded/x/y/Z.class");
        let text = String::from_utf8_lossy(&relocated.content);
        assert!(text.contains("a/b/v1/shaded/x/y/Z"));
        assert!(text.contains("a/b/v1/W"));
        assert!(!text.contains("\u{1}\u{0}\u{5}x/y/Z"));
    }

    #[test]
    fn test_service_descriptor_name_and_lines() {
        let plan = chained_plan();
        let entry = ArchiveEntry::new("META-INF/services/x.y.Service", b"x.y.Impl\n".to_vec());
        let relocated = plan.apply(entry);
        assert_eq!(relocated.path, "META-INF/services/a.b.v1.shaded.x.y.Service");
        assert_eq!(relocated.content, b"a.b.v1.shaded.x.y.Impl\n");
    }

    #[test]
    fn test_plan_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RelocationPlan>();
    }
}
