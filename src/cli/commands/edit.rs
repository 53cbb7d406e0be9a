use crate::cli::commands::cell_args;
use crate::cli::context;
use crate::cli::output;
use crate::core::errors::Result;
use crate::core::models::request::RowRef;

/// Execute the `signoff edit` command.
///
/// Writes the cells the way any sheet user would, then delivers the edit
/// notification so meaningful changes send the request back for approval.
pub fn execute(row: u32, sets: &[String], actor: &str) -> Result<()> {
    let (_, approvals) = context::open_project()?;

    let row = RowRef(row);
    let fields = cell_args::parse(sets)?;
    let outcome = approvals.apply_edit(row, &fields, actor)?;
    output::success(&format!("Updated {} cell(s) on {row}", fields.len()));

    if outcome.reopened.is_empty() {
        if outcome.meaningful_headers.is_empty() {
            output::detail("no meaningful column changed; approval untouched");
        }
    } else {
        output::warning(&format!(
            "{row} needs reapproval (edited: {})",
            outcome.meaningful_headers.join(", ")
        ));
    }
    Ok(())
}
