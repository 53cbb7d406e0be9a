use crate::cli::commands::cell_args;
use crate::cli::context;
use crate::cli::output;
use crate::core::errors::Result;

/// Execute the `signoff add` command.
///
/// Appends a request row. The status defaults to the pending label; the
/// request id is assigned on its first decision.
pub fn execute(sets: &[String]) -> Result<()> {
    let (_, approvals) = context::open_project()?;

    let fields = cell_args::parse(sets)?;
    let row = approvals.add_request(&fields)?;

    output::success(&format!("Added request at {row}"));
    Ok(())
}
