use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use gix::discover;

/// Find the work-tree root of the git repository containing `current_dir`
pub fn find_project_root(current_dir: &Path) -> Result<PathBuf> {
    let repo = discover(current_dir)
        .with_context(|| format!("No git repository found at {}", current_dir.display()))?;
    let root = repo
        .workdir()
        .context("Not a git working directory. Ensure you are inside a git repository.")?;
    Ok(root.to_path_buf())
}
