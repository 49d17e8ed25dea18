use std::collections::VecDeque;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use ignore::WalkBuilder;
use shadowpack_core::{ArchiveEntry, EntrySink, EntrySource};
use tokio::fs::{create_dir_all, read, write};

/// Convert a file below `root` into a `/`-separated archive entry path
pub fn get_entry_path(root: &Path, file: &Path) -> Result<String> {
    let relative = file
        .strip_prefix(root)
        .with_context(|| format!("{} is not inside {}", file.display(), root.display()))?;
    let segments = relative
        .components()
        .map(|component| match component {
            Component::Normal(segment) => segment
                .to_str()
                .with_context(|| format!("Non UTF-8 file name in {}", file.display())),
            _ => Err(anyhow::anyhow!(
                "Unexpected path component in {}",
                file.display()
            )),
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(segments.join("/"))
}

/// Entries of an exploded archive directory, in path order.
///
/// Hidden files and ignore files are not special here: everything under the
/// root is part of the archive.
#[derive(Debug)]
pub struct DirectorySource {
    root: PathBuf,
    files: VecDeque<PathBuf>,
}

impl DirectorySource {
    /// # Errors
    /// Returns error if the directory cannot be walked.
    pub fn open(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(anyhow::anyhow!("{} is not a directory", root.display()));
        }
        let mut files = VecDeque::new();
        for entry in WalkBuilder::new(root)
            .standard_filters(false)
            .sort_by_file_path(|a, b| a.cmp(b))
            .build()
        {
            let entry = entry?;
            if entry.file_type().is_some_and(|file_type| file_type.is_file()) {
                files.push_back(entry.into_path());
            }
        }
        Ok(Self {
            root: root.to_path_buf(),
            files,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[async_trait]
impl EntrySource for DirectorySource {
    async fn next_entry(&mut self) -> Result<Option<ArchiveEntry>> {
        let Some(file) = self.files.pop_front() else {
            return Ok(None);
        };
        let path = get_entry_path(&self.root, &file)?;
        let content = read(&file)
            .await
            .with_context(|| format!("Failed to read {}", file.display()))?;
        Ok(Some(ArchiveEntry { path, content }))
    }
}

/// Writes entries below an output directory, creating parents as needed.
#[derive(Debug)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    fn target(&self, entry_path: &str) -> Result<PathBuf> {
        let relative = Path::new(entry_path);
        if entry_path.is_empty()
            || !relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)))
        {
            return Err(anyhow::anyhow!(
                "Refusing to write entry outside the output directory: {entry_path}"
            ));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl EntrySink for DirectorySink {
    async fn write_entry(&mut self, entry: &ArchiveEntry) -> Result<()> {
        let target = self.target(&entry.path)?;
        if entry.path.ends_with('/') {
            create_dir_all(&target).await?;
            return Ok(());
        }
        if let Some(parent) = target.parent() {
            create_dir_all(parent).await?;
        }
        write(&target, &entry.content)
            .await
            .with_context(|| format!("Failed to write {}", target.display()))
    }

    async fn finish(&mut self) -> Result<()> {
        create_dir_all(&self.root).await?;
        Ok(())
    }
}
