use tokio::fs::{create_dir_all, write};

use anyhow::Result;
use clap::Args;
use shadowpack_core::Config;
use shadowpack_utils::{CONFIG_FILE_NAME, get_shadowpack_dir};

#[derive(Args, Debug)]
#[command(about = "Initialize a new shadowpack project")]
pub struct InitArgs {
    /// If true, do not make any filesystem changes.
    #[arg(short, long, default_value = "false")]
    dry_run: bool,
}

/// Initialize a new shadowpack project
///
/// # Errors
/// Returns error if the project is already initialized or the config cannot be written.
pub async fn handle_init(args: &InitArgs) -> Result<()> {
    let current_dir = std::env::current_dir()?;
    let shadowpack_dir = get_shadowpack_dir(&current_dir)?;
    let config_file = shadowpack_dir.join(CONFIG_FILE_NAME);
    if config_file.exists() {
        return Err(anyhow::anyhow!("shadowpack project already initialized"));
    }
    if !args.dry_run {
        create_dir_all(&shadowpack_dir).await?;
        write(
            &config_file,
            serde_json::to_string_pretty(&Config::default())?,
        )
        .await?;
    }

    println!(
        "shadowpack project initialized in {}",
        shadowpack_dir.display()
    );
    Ok(())
}
