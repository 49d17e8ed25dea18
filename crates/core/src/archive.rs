use anyhow::Result;
use async_trait::async_trait;

use crate::entry::ArchiveEntry;

/// Host-side enumeration of the entries of an input archive.
///
/// Implementations decide the order; relocation output keeps it.
#[async_trait]
pub trait EntrySource: std::fmt::Debug + Send {
    /// # Errors
    /// Returns error if reading the next entry fails.
    async fn next_entry(&mut self) -> Result<Option<ArchiveEntry>>;
}

/// Host-side assembly of the output archive.
#[async_trait]
pub trait EntrySink: std::fmt::Debug + Send {
    /// # Errors
    /// Returns error if the entry cannot be written.
    async fn write_entry(&mut self, entry: &ArchiveEntry) -> Result<()>;

    /// Called once after the last entry.
    /// # Errors
    /// Returns error if finalizing the archive fails.
    async fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}
