use anyhow::Result;

use clap::{Parser, Subcommand};

use crate::commands::{
    ConfigArgs, InitArgs, PlanArgs, RelocateArgs, ScanArgs, handle_config, handle_init,
    handle_plan, handle_relocate, handle_scan,
};
pub mod commands;
mod context;
pub mod options;
pub mod prompter;

pub use prompter::UserCancelled;

#[derive(Parser, Debug)]
#[command(
    name = "shadowpack",
    author,
    version,
    about = "Relocate packages inside shaded JVM archives",
    help_template = "{name} {version}\n{about}\n\n{usage-heading} {usage}\n\n{all-args}"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Init(InitArgs),
    Config(ConfigArgs),
    Plan(PlanArgs),
    Relocate(RelocateArgs),
    Scan(ScanArgs),
}

/// # Errors
/// Returns error if the selected command fails.
pub async fn main(args: &[String]) -> Result<()> {
    let cli = Cli::parse_from(args);
    match cli.command {
        Commands::Init(args) => handle_init(&args).await?,
        Commands::Config(args) => handle_config(&args).await?,
        Commands::Plan(args) => handle_plan(&args).await?,
        Commands::Relocate(args) => handle_relocate(&args).await?,
        Commands::Scan(args) => handle_scan(&args).await?,
    }
    Ok(())
}
