use colored::Colorize;

use crate::cli::context;
use crate::cli::output;
use crate::core::errors::Result;

/// Execute the `signoff status` command.
///
/// Request counts by state plus configuration and audit chain health.
pub fn execute() -> Result<()> {
    let (app, approvals) = context::open_project()?;
    let config = approvals.config();

    output::header(&format!("Signoff v{}", env!("CARGO_PKG_VERSION")));
    output::field("Sheet", &app.signoff.sheet);
    output::field("Audit log", &app.audit.log_file);
    output::field(
        "Hash column",
        config.headers.approved_hash.as_deref().unwrap_or("(none, drift scan off)"),
    );
    let tracked = &config.reapproval.tracked_headers;
    output::field(
        "Reapproval",
        &if !config.reapproval.enabled {
            "off".to_string()
        } else if tracked.is_empty() {
            "any non-exempt column".to_string()
        } else {
            tracked.iter().cloned().collect::<Vec<_>>().join(", ")
        },
    );

    let counts = approvals.summary()?;
    println!("\n{}", format!("  Requests ({})", counts.total()).bold());
    println!("  {:<10} {}", "pending".blue(), counts.pending);
    println!("  {:<10} {}", "approved".green(), counts.approved);
    println!("  {:<10} {}", "rejected".red(), counts.rejected);
    if counts.unset > 0 {
        println!("  {:<10} {}", "unset".dimmed(), counts.unset);
    }

    println!("\n{}", "  Audit".bold());
    match approvals.verify_chain() {
        Ok(report) if report.is_intact() => output::success(&format!(
            "{} event(s), chain intact",
            report.events_checked
        )),
        Ok(report) => output::warning(&format!(
            "{} event(s), chain broken at event {}. Run 'signoff verify'.",
            report.events_checked,
            report.first_break().unwrap_or_default()
        )),
        Err(e) => output::warning(&format!("Could not read audit log: {e}")),
    }
    Ok(())
}
