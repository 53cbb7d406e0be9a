use crate::cli::context;
use crate::cli::output;
use crate::core::errors::{Result, SignoffError};

/// Execute the `signoff verify` command.
///
/// Recomputes every snapshot digest and the chain from genesis. Exits
/// non-zero when any event fails.
pub fn execute() -> Result<()> {
    let (app, approvals) = context::open_project()?;
    let report = approvals.verify_chain()?;

    output::header("signoff verify");
    output::field("Events", &report.events_checked.to_string());
    output::field("Chained", &report.chained_events.to_string());
    if !app.audit.hash_chain {
        output::warning("Hash chaining is disabled; new events are not chained");
    }

    let Some(first) = report.first_break() else {
        output::success("Audit chain intact");
        return Ok(());
    };

    for b in &report.breaks {
        output::error(&b.to_string());
    }
    Err(SignoffError::ChainBroken {
        first,
        count: report.breaks.len(),
    })
}
