use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use colored::Colorize;

use crate::cli::context;
use crate::cli::output;
use crate::core::errors::{Result, SignoffError};
use crate::core::models::audit_event::{AuditAction, AuditEvent};
use crate::core::models::log_filter::LogFilter;

/// Execute the `signoff log` command.
///
/// Displays the audit log with optional filters for actor, date, request
/// and entry count.
pub fn execute(
    by: Option<&str>,
    since: Option<&str>,
    request: Option<&str>,
    last: Option<usize>,
) -> Result<()> {
    let (_, approvals) = context::open_project()?;

    let filter = LogFilter {
        actor: by.map(str::to_string),
        since: since.map(parse_since).transpose()?,
        request_id: request.map(str::to_string),
    };
    let events = approvals.ledger_store().query(&filter)?;

    if events.is_empty() {
        output::header("signoff log");
        output::warning("No audit events found");
        if by.is_some() || since.is_some() || request.is_some() {
            println!("  Try removing filters to see all events.");
        }
        return Ok(());
    }

    let skip = last.map_or(0, |n| events.len().saturating_sub(n));
    let display = &events[skip..];

    output::header(&format!("signoff log ({} events)", display.len()));
    println!();
    for event in display {
        print_event(event);
    }
    Ok(())
}

/// Parse a date string (ISO 8601: `YYYY-MM-DD`) into a UTC DateTime.
fn parse_since(s: &str) -> Result<chrono::DateTime<Utc>> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| SignoffError::InvalidConfig {
            detail: format!(
                "Invalid date format: '{s}'. Expected ISO 8601 (YYYY-MM-DD), e.g. 2026-01-15"
            ),
        })
        .map(|d| Utc.from_utc_datetime(&d.and_time(NaiveTime::MIN)))
}

fn print_event(event: &AuditEvent) {
    let date = event.event_at.format("%Y-%m-%d %H:%M:%S");
    let row = event
        .row_ref
        .map(|r| r.to_string())
        .unwrap_or_else(|| "-".to_string());
    let request = if event.request_id.is_empty() {
        "-".dimmed().to_string()
    } else {
        event.request_id.clone()
    };

    println!(
        "  {} {} {:<22} {:<8} {} {}",
        date.to_string().dimmed(),
        "│".dimmed(),
        format_action(event.action),
        row,
        request,
        event.actor.dimmed(),
    );
}

fn format_action(action: AuditAction) -> String {
    let name = action.as_str();
    match action {
        AuditAction::Approved => name.green().to_string(),
        AuditAction::Rejected => name.red().to_string(),
        AuditAction::Pending => name.blue().to_string(),
        AuditAction::ReapprovalRequired => name.yellow().to_string(),
        AuditAction::ApprovalHashSet => name.cyan().to_string(),
        AuditAction::Setup => name.cyan().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn since_is_midnight_utc() {
        let dt = parse_since("2026-01-15").unwrap();
        assert_eq!(dt.to_rfc3339(), "2026-01-15T00:00:00+00:00");
    }

    #[test]
    fn bad_since_is_rejected() {
        assert!(parse_since("15/01/2026").is_err());
    }
}
