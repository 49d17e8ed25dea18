use serde::{Deserialize, Serialize};

/// A single path change made while relocating an archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelocatedPath {
    pub from: String,
    pub to: String,
}

/// Summary of one relocation pass, printed as JSON for CI.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelocationReport {
    /// Entries read from the source
    pub entries: usize,
    /// Entries whose path changed, in source order
    pub relocated: Vec<RelocatedPath>,
    /// Entries whose content was rewritten
    pub rewritten: usize,
    /// Entries dropped by ignore patterns
    pub ignored: usize,
    /// Output paths produced more than once; only the first entry was kept
    pub duplicates: Vec<String>,
}

impl RelocationReport {
    #[must_use]
    pub fn written(&self) -> usize {
        self.entries - self.ignored - self.duplicates.len()
    }
}
