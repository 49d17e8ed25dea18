use std::path::{Path, PathBuf};

use anyhow::Result;
use shadowpack_core::{Config, RelocationPlan};
use shadowpack_utils::{display_warning, find_project_root, get_shadowpack_config, read_config_file};

use crate::options::FormatOptions;

pub struct CommandContext {
    pub current_dir: PathBuf,
    pub config: Config,
}

impl CommandContext {
    /// Load the config from `config_path`, or from `.shadowpack/config.json` at the git root.
    ///
    /// # Errors
    /// Returns error if the config cannot be read or the git repository cannot be found.
    pub async fn new(config_path: Option<&Path>) -> Result<Self> {
        let current_dir = std::env::current_dir()?;
        let config = match config_path {
            Some(path) => read_config_file(path).await?,
            None => get_shadowpack_config(&current_dir).await?,
        };
        Ok(Self {
            current_dir,
            config,
        })
    }

    /// Like [`Self::new`], but outside a git work tree the default config is used
    /// instead of failing. For commands that work without a config file.
    ///
    /// # Errors
    /// Returns error if a config file exists but cannot be read.
    pub async fn new_or_default(config_path: Option<&Path>) -> Result<Self> {
        if config_path.is_some() {
            return Self::new(config_path).await;
        }
        let current_dir = std::env::current_dir()?;
        let config = match find_project_root(&current_dir) {
            Ok(_) => get_shadowpack_config(&current_dir).await?,
            Err(e) => {
                tracing::debug!(error = %e, "no git work tree, using the default config");
                Config::default()
            }
        };
        Ok(Self {
            current_dir,
            config,
        })
    }

    /// Build the relocation plan, printing lint warnings.
    ///
    /// # Errors
    /// Returns error if a rule is invalid, or if the config is strict and the plan has warnings.
    pub fn plan(&self, format: FormatOptions) -> Result<RelocationPlan> {
        let plan = self.config.build_plan()?;
        let warnings = plan.warnings();
        if let FormatOptions::Stdout = format {
            for warning in &warnings {
                eprintln!("{}", display_warning(warning));
            }
        }
        if self.config.strict && !warnings.is_empty() {
            return Err(anyhow::anyhow!(
                "relocation plan has {} warning(s) and strict mode is enabled",
                warnings.len()
            ));
        }
        Ok(plan)
    }

    /// Resolve a user-supplied path against the directory the command runs in
    #[must_use]
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.current_dir.join(path)
        }
    }
}
