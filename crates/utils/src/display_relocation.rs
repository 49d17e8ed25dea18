use colored::Colorize;
use shadowpack_core::{
    BadCall, EntryKind, PlanWarning, RelocatedPath, RelocationPlan, RelocationReport,
};

/// One line per rule, in application order
#[must_use]
pub fn display_plan(plan: &RelocationPlan) -> String {
    plan.rules()
        .enumerate()
        .map(|(index, rule)| {
            let mut line = format!(
                "{} {} {} {}",
                format!("#{index}").bright_black(),
                rule.from_package.bright_white().bold(),
                "→".bright_cyan(),
                rule.to_package.bright_green()
            );
            if !rule.excludes.is_empty() {
                line.push_str(&format!(
                    " {}",
                    format!("(excludes: {})", rule.excludes.join(", ")).bright_black()
                ));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[must_use]
pub fn display_warning(warning: &PlanWarning) -> String {
    format!("{} {}", "warning:".yellow().bold(), warning)
}

#[must_use]
pub fn display_relocated(relocated: &RelocatedPath) -> String {
    format!(
        "[{}] {} {} {}",
        EntryKind::of(&relocated.to),
        relocated.from.bright_black(),
        "→".bright_cyan(),
        relocated.to.bright_white()
    )
}

#[must_use]
pub fn display_report(report: &RelocationReport) -> String {
    let mut summary = format!(
        "{} entries: {} relocated, {} rewritten, {} ignored",
        report.entries.to_string().bold(),
        report.relocated.len().to_string().bright_green(),
        report.rewritten.to_string().bright_cyan(),
        report.ignored.to_string().bright_black(),
    );
    if !report.duplicates.is_empty() {
        summary.push_str(&format!(
            ", {}",
            format!("{} duplicates skipped", report.duplicates.len()).yellow()
        ));
    }
    summary
}

#[must_use]
pub fn display_bad_call(call: &BadCall) -> String {
    format!(
        "{} {} {} {}.{}{} {}",
        "bad call:".red().bold(),
        call.class.bright_white(),
        "→".bright_cyan(),
        call.owner,
        call.name.bold(),
        call.descriptor,
        format!("({})", call.annotation).bright_black()
    )
}
