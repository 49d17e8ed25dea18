use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use shadowpack_core::BadCallScanner;
use shadowpack_utils::{DirectorySource, collect_entries, display_bad_call};

use crate::{context::CommandContext, options::FormatOptions};

#[derive(Args, Debug)]
#[command(about = "Find calls to members marked with a forbidden annotation")]
pub struct ScanArgs {
    /// Directory holding the unpacked archive
    input: PathBuf,

    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Annotation descriptor to look for, in addition to badAnnotations from the config
    #[arg(short, long)]
    annotation: Vec<String>,

    #[arg(long, default_value = "stdout")]
    format: FormatOptions,
}

/// Scan an exploded archive for bad calls; fails when any are found
///
/// # Errors
/// Returns error if a class file is malformed or a bad call is found.
pub async fn handle_scan(args: &ScanArgs) -> Result<()> {
    let ctx = CommandContext::new_or_default(args.config.as_deref()).await?;
    let annotations = ctx
        .config
        .bad_annotations
        .iter()
        .chain(&args.annotation)
        .cloned()
        .collect::<Vec<_>>();
    if annotations.is_empty() {
        args.format.print("No bad annotations configured", "[]");
        return Ok(());
    }

    let mut source = DirectorySource::open(&ctx.resolve(&args.input))?;
    let entries = collect_entries(&mut source).await?;
    let bad_calls = BadCallScanner::new(annotations).scan(&entries)?;

    if let FormatOptions::Stdout = args.format {
        for call in &bad_calls {
            println!("{}", display_bad_call(call));
        }
    }
    args.format.print(
        &if bad_calls.is_empty() {
            format!("{} no bad calls found", "ok:".green().bold())
        } else {
            format!("{} bad call(s) found", bad_calls.len().to_string().red().bold())
        },
        &serde_json::to_string_pretty(&bad_calls)?,
    );
    if !bad_calls.is_empty() {
        return Err(anyhow::anyhow!("{} bad call(s) found", bad_calls.len()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        scan: ScanArgs,
    }

    #[test]
    fn test_scan_args_parsing() {
        let cli = TestCli::parse_from([
            "test",
            "build/server",
            "-a",
            "Lx/DoNotUse;",
            "--annotation",
            "Ly/Internal;",
        ]);
        assert_eq!(cli.scan.input, PathBuf::from("build/server"));
        assert_eq!(cli.scan.annotation, vec!["Lx/DoNotUse;", "Ly/Internal;"]);
        assert_eq!(cli.scan.format, FormatOptions::Stdout);
    }
}
