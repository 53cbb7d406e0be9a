use crate::cli::context;
use crate::cli::output;
use crate::core::errors::Result;

/// Execute the `signoff scan` command.
pub fn execute(actor: &str) -> Result<()> {
    let (_, approvals) = context::open_project()?;
    let report = approvals.scan_for_drift(actor)?;

    output::header("signoff scan");
    if report.hashes_initialized > 0 {
        output::success(&format!(
            "Recorded approval hash for {} request(s)",
            report.hashes_initialized
        ));
    }
    if report.reopened == 0 {
        output::success("No drift: every approved request matches its approval");
        return Ok(());
    }

    output::warning(&format!(
        "{} approved request(s) changed since approval and were reopened",
        report.reopened
    ));
    for row in &report.reopened_rows {
        output::detail(&row.to_string());
    }
    Ok(())
}
