use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use shadowpack_core::Config;
use tokio::fs::read_to_string;

use crate::find_project_root;

pub const CONFIG_FILE_NAME: &str = "config.json";

/// `.shadowpack` directory at the root of the enclosing git work tree
pub fn get_shadowpack_dir(current_dir: &Path) -> Result<PathBuf> {
    Ok(find_project_root(current_dir)?.join(".shadowpack"))
}

/// Load `.shadowpack/config.json`, falling back to defaults when it does not exist
pub async fn get_shadowpack_config(current_dir: &Path) -> Result<Config> {
    let config_file = get_shadowpack_dir(current_dir)?.join(CONFIG_FILE_NAME);
    if !config_file.exists() {
        return Ok(Config::default());
    }
    read_config_file(&config_file).await
}

/// Load a config from an explicit path; the file must exist
pub async fn read_config_file(path: &Path) -> Result<Config> {
    let content = read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config = serde_json::from_str(&content)
        .with_context(|| format!("Invalid shadowpack config in {}", path.display()))?;
    Ok(config)
}
