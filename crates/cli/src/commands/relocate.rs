use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use clap::Args;
use shadowpack_core::{ArchiveEntry, EntrySink};
use shadowpack_utils::{
    DirectorySink, DirectorySource, compile_ignore_patterns, display_relocated, display_report,
    relocate_entries,
};

use crate::{
    context::CommandContext,
    options::FormatOptions,
    prompter::{InquirePrompter, Prompter},
};

#[derive(Args, Debug)]
#[command(about = "Relocate the packages of an exploded archive")]
pub struct RelocateArgs {
    /// Directory holding the unpacked archive
    input: PathBuf,

    /// Directory the relocated entries are written to
    output: PathBuf,

    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Relocate in memory and report, without writing the output
    #[arg(short, long)]
    dry_run: bool,

    /// Write into a non-empty output directory without asking
    #[arg(short, long)]
    yes: bool,

    #[arg(long, default_value = "stdout")]
    format: FormatOptions,
}

/// Drops every entry; used by `--dry-run`.
#[derive(Debug, Default)]
struct DiscardSink;

#[async_trait]
impl EntrySink for DiscardSink {
    async fn write_entry(&mut self, _entry: &ArchiveEntry) -> Result<()> {
        Ok(())
    }
}

fn is_non_empty_dir(path: &Path) -> Result<bool> {
    if !path.is_dir() {
        return Ok(false);
    }
    Ok(std::fs::read_dir(path)?.next().is_some())
}

/// Relocate an exploded archive
///
/// # Errors
/// Returns error if the plan is invalid, a class file is malformed or the output cannot be written.
pub async fn handle_relocate(args: &RelocateArgs) -> Result<()> {
    handle_relocate_with_prompter(args, &InquirePrompter).await
}

/// Relocate an exploded archive, confirming through `prompter`
///
/// # Errors
/// Returns error if the plan is invalid, a class file is malformed or the output cannot be written.
pub async fn handle_relocate_with_prompter(
    args: &RelocateArgs,
    prompter: &dyn Prompter,
) -> Result<()> {
    let ctx = CommandContext::new(args.config.as_deref()).await?;
    let plan = Arc::new(ctx.plan(args.format)?);
    let ignore = compile_ignore_patterns(&ctx.config.ignore)?;

    let input = ctx.resolve(&args.input);
    let output = ctx.resolve(&args.output);
    if input == output {
        return Err(anyhow::anyhow!(
            "Input and output must be different directories: {}",
            input.display()
        ));
    }
    let mut source = DirectorySource::open(&input)?;
    tracing::info!(
        input = %input.display(),
        entries = source.len(),
        rules = plan.len(),
        "relocating archive"
    );

    let report = if args.dry_run {
        args.format.status("Dry run, no entries will be written");
        relocate_entries(plan, &mut source, &mut DiscardSink, &ignore).await?
    } else {
        let confirm = if args.yes || !is_non_empty_dir(&output)? {
            true
        } else {
            prompter.confirm(&format!(
                "{} is not empty. Write relocated entries into it anyway?",
                output.display()
            ))?
        };
        if !confirm {
            args.format.print("Relocation cancelled", "{}");
            return Ok(());
        }
        let mut sink = DirectorySink::new(&output);
        relocate_entries(plan, &mut source, &mut sink, &ignore).await?
    };

    if let FormatOptions::Stdout = args.format {
        for relocated in &report.relocated {
            println!("{}", display_relocated(relocated));
        }
    }
    args.format.print(&display_report(&report), &serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        relocate: RelocateArgs,
    }

    #[test]
    fn test_relocate_args_parsing() {
        let cli = TestCli::parse_from(["test", "in", "out"]);
        assert_eq!(cli.relocate.input, PathBuf::from("in"));
        assert_eq!(cli.relocate.output, PathBuf::from("out"));
        assert!(!cli.relocate.dry_run);
        assert!(!cli.relocate.yes);
        assert_eq!(cli.relocate.format, FormatOptions::Stdout);

        let cli = TestCli::parse_from(["test", "in", "out", "-d", "-y", "--format", "json"]);
        assert!(cli.relocate.dry_run);
        assert!(cli.relocate.yes);
        assert_eq!(cli.relocate.format, FormatOptions::Json);
    }

    #[test]
    fn test_relocate_args_require_paths() {
        assert!(TestCli::try_parse_from(["test", "in"]).is_err());
    }

    #[test]
    fn test_is_non_empty_dir() {
        let temp_dir = TempDir::new().unwrap();
        assert!(!is_non_empty_dir(temp_dir.path()).unwrap());
        assert!(!is_non_empty_dir(&temp_dir.path().join("missing")).unwrap());
        std::fs::write(temp_dir.path().join("a.txt"), b"a").unwrap();
        assert!(is_non_empty_dir(temp_dir.path()).unwrap());
    }

    #[tokio::test]
    async fn test_discard_sink() {
        let mut sink = DiscardSink;
        sink.write_entry(&ArchiveEntry::new("a/B.class", Vec::new()))
            .await
            .unwrap();
        sink.finish().await.unwrap();
    }
}
