use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use shadowpack_utils::display_plan;

use crate::{context::CommandContext, options::FormatOptions};

#[derive(Args, Debug)]
#[command(about = "Validate the relocation rules and show the plan")]
pub struct PlanArgs {
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long, default_value = "stdout")]
    format: FormatOptions,
}

/// Build the relocation plan and print its rules in application order
///
/// # Errors
/// Returns error if a rule is invalid or the plan fails the strict lint.
pub async fn handle_plan(args: &PlanArgs) -> Result<()> {
    let ctx = CommandContext::new(args.config.as_deref()).await?;
    let plan = ctx.plan(args.format)?;
    if plan.is_empty() {
        args.format.print(
            "No relocation rules configured",
            &serde_json::json!({ "rules": [], "warnings": [] }).to_string(),
        );
        return Ok(());
    }
    let rules: Vec<_> = plan.rules().collect();
    args.format.print(
        &display_plan(&plan),
        &serde_json::json!({ "rules": rules, "warnings": plan.warnings() }).to_string(),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        plan: PlanArgs,
    }

    #[test]
    fn test_plan_args_parsing() {
        let cli = TestCli::parse_from(["test"]);
        assert!(cli.plan.config.is_none());
        assert_eq!(cli.plan.format, FormatOptions::Stdout);

        let cli = TestCli::parse_from(["test", "-c", "rules.json", "--format", "json"]);
        assert_eq!(cli.plan.config, Some(PathBuf::from("rules.json")));
        assert_eq!(cli.plan.format, FormatOptions::Json);
    }
}
