use colored::Colorize;
use std::fmt::Display;

pub(crate) const SERVICES_PREFIX: &str = "META-INF/services/";
pub(crate) const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";
pub(crate) const VERSIONS_PREFIX: &str = "META-INF/versions/";

/// A single file inside an archive, addressed by its `/`-separated path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub path: String,
    pub content: Vec<u8>,
}

impl ArchiveEntry {
    pub fn new(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> EntryKind {
        EntryKind::of(&self.path)
    }
}

/// How an entry's content is treated during relocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EntryKind {
    Directory,
    Class,
    ServiceDescriptor,
    Manifest,
    Resource,
}

impl EntryKind {
    #[must_use]
    pub fn of(path: &str) -> Self {
        if path.ends_with('/') {
            Self::Directory
        } else if path == MANIFEST_PATH {
            Self::Manifest
        } else if path
            .strip_prefix(SERVICES_PREFIX)
            .is_some_and(|name| !name.is_empty() && !name.contains('/'))
        {
            Self::ServiceDescriptor
        } else if path.ends_with(".class") {
            Self::Class
        } else {
            Self::Resource
        }
    }
}

impl Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Directory => "dir".dimmed(),
                Self::Class => "class".cyan().bold(),
                Self::ServiceDescriptor => "service".magenta().bold(),
                Self::Manifest => "manifest".yellow().bold(),
                Self::Resource => "resource".green(),
            }
        )
    }
}

/// Splits `META-INF/versions/<n>/` off a multi-release entry path.
pub(crate) fn split_version_prefix(path: &str) -> (&str, &str) {
    if let Some(rest) = path.strip_prefix(VERSIONS_PREFIX)
        && let Some(slash) = rest.find('/')
        && slash > 0
        && rest[..slash].chars().all(|c| c.is_ascii_digit())
    {
        let split = VERSIONS_PREFIX.len() + slash + 1;
        return path.split_at(split);
    }
    ("", path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("org/bukkit/", EntryKind::Directory)]
    #[case("org/bukkit/craftbukkit/Main.class", EntryKind::Class)]
    #[case("META-INF/MANIFEST.MF", EntryKind::Manifest)]
    #[case("META-INF/services/org.bukkit.plugin.PluginLoader", EntryKind::ServiceDescriptor)]
    #[case("META-INF/services/", EntryKind::Directory)]
    #[case("META-INF/services/nested/file", EntryKind::Resource)]
    #[case("log4j2.xml", EntryKind::Resource)]
    fn test_entry_kind(#[case] path: &str, #[case] expected: EntryKind) {
        assert_eq!(ArchiveEntry::new(path, Vec::new()).kind(), expected);
    }

    #[rstest]
    #[case("META-INF/versions/9/a/b/C.class", "META-INF/versions/9/", "a/b/C.class")]
    #[case("META-INF/versions/17/module-info.class", "META-INF/versions/17/", "module-info.class")]
    #[case("META-INF/versions/x/a/B.class", "", "META-INF/versions/x/a/B.class")]
    #[case("a/b/C.class", "", "a/b/C.class")]
    fn test_split_version_prefix(
        #[case] path: &str,
        #[case] prefix: &str,
        #[case] rest: &str,
    ) {
        assert_eq!(split_version_prefix(path), (prefix, rest));
    }

    #[test]
    fn test_entry_kind_display() {
        assert!(format!("{}", EntryKind::Class).contains("class"));
        assert!(format!("{}", EntryKind::ServiceDescriptor).contains("service"));
    }
}
