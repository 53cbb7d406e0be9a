use chrono::{DateTime, Utc};

use crate::core::models::audit_event::AuditEvent;

/// Filters for browsing the audit ledger. Empty fields match everything.
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    /// Case-insensitive substring of the actor.
    pub actor: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub request_id: Option<String>,
}

impl LogFilter {
    pub fn matches(&self, event: &AuditEvent) -> bool {
        if let Some(actor) = &self.actor
            && !event.actor.to_lowercase().contains(&actor.to_lowercase())
        {
            return false;
        }
        if let Some(since) = self.since
            && event.event_at < since
        {
            return false;
        }
        if let Some(id) = &self.request_id
            && &event.request_id != id
        {
            return false;
        }
        true
    }

    /// Apply the filter, keeping ledger order.
    pub fn apply(&self, events: Vec<AuditEvent>) -> Vec<AuditEvent> {
        events.into_iter().filter(|e| self.matches(e)).collect()
    }
}
