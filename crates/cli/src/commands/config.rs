use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::context::CommandContext;

#[derive(Args, Debug)]
#[command(about = "Show the effective shadowpack configuration")]
pub struct ConfigArgs {
    /// Read the configuration from this file instead of .shadowpack/config.json
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// Display shadowpack configuration, with defaults filled in
///
/// # Errors
/// Returns error if reading the configuration fails.
pub async fn handle_config(args: &ConfigArgs) -> Result<()> {
    let ctx = CommandContext::new(args.config.as_deref()).await?;
    println!("{}", serde_json::to_string_pretty(&ctx.config)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        config: ConfigArgs,
    }

    #[test]
    fn test_config_args_parsing() {
        let cli = TestCli::parse_from(["test"]);
        assert!(cli.config.config.is_none());

        let cli = TestCli::parse_from(["test", "--config", "shade.json"]);
        assert_eq!(cli.config.config, Some(PathBuf::from("shade.json")));
    }
}
