use colored::Colorize;

use crate::cli::DecisionArgs;
use crate::cli::context;
use crate::cli::output;
use crate::core::errors::Result;
use crate::core::models::request::RowRef;
use crate::core::models::status::Status;

/// Execute `signoff approve`, `signoff reject` or `signoff reset`.
pub fn execute(target: Status, args: &DecisionArgs, actor: &str) -> Result<()> {
    let (_, approvals) = context::open_project()?;
    let rows: Vec<RowRef> = args.rows.iter().copied().map(RowRef).collect();

    let outcome = approvals.decide(&rows, target, actor, &args.notes)?;

    output::header(&format!("signoff {}", verb(target)));
    for decided in &outcome.rows {
        output::success(&format!(
            "{} {} {} {}",
            decided.row,
            decided.request_id.dimmed(),
            "→".dimmed(),
            decided.status
        ));
        if let Some(hash) = &decided.approved_hash {
            output::detail(&format!("approved hash {}", &hash[..hash.len().min(16)]));
        }
    }
    println!("\n  {} row(s) recorded by {actor}", outcome.rows.len());
    Ok(())
}

fn verb(target: Status) -> &'static str {
    match target {
        Status::Approved => "approve",
        Status::Rejected => "reject",
        Status::Pending => "reset",
    }
}
