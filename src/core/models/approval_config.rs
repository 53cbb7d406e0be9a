use std::collections::BTreeSet;
use std::time::Duration;

use crate::core::models::status::Status;

/// Column names the core reads and writes.
///
/// The five required columns must exist in the sheet before any call
/// mutates anything. The approved-hash column is optional; without it
/// approvals are recorded but drift cannot be detected.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderNames {
    pub id: String,
    pub status: String,
    pub approver: String,
    pub decision_at: String,
    pub decision_notes: String,
    pub approved_hash: Option<String>,
}

impl HeaderNames {
    /// The required columns in sheet order.
    pub fn required(&self) -> [&str; 5] {
        [
            &self.id,
            &self.status,
            &self.approver,
            &self.decision_at,
            &self.decision_notes,
        ]
    }
}

impl Default for HeaderNames {
    fn default() -> Self {
        Self {
            id: "RequestId".into(),
            status: "Status".into(),
            approver: "Approver".into(),
            decision_at: "DecidedAt".into(),
            decision_notes: "DecisionNotes".into(),
            approved_hash: Some("ApprovedHash".into()),
        }
    }
}

/// Text written into the status column for each state.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusLabels {
    pub pending: String,
    pub approved: String,
    pub rejected: String,
}

impl StatusLabels {
    pub fn label(&self, status: Status) -> &str {
        match status {
            Status::Pending => &self.pending,
            Status::Approved => &self.approved,
            Status::Rejected => &self.rejected,
        }
    }

    /// Map a status cell back to a state. Labels match case-insensitively;
    /// canonical names are accepted as a fallback. Blank or unknown text
    /// yields `None`.
    pub fn parse(&self, cell: &str) -> Option<Status> {
        let cell = cell.trim();
        if cell.is_empty() {
            return None;
        }
        Status::ALL
            .into_iter()
            .find(|s| self.label(*s).eq_ignore_ascii_case(cell))
            .or_else(|| cell.parse().ok())
    }
}

impl Default for StatusLabels {
    fn default() -> Self {
        Self {
            pending: Status::Pending.as_str().into(),
            approved: Status::Approved.as_str().into(),
            rejected: Status::Rejected.as_str().into(),
        }
    }
}

/// Which edits invalidate an approval, and from which states.
#[derive(Debug, Clone, PartialEq)]
pub struct ReapprovalPolicy {
    pub enabled: bool,
    /// When non-empty, only these columns are meaningful.
    pub tracked_headers: BTreeSet<String>,
    pub exempt_headers: BTreeSet<String>,
    pub from_statuses: BTreeSet<Status>,
}

/// Advisory row guard behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct GuardPolicy {
    pub lock_on_approve: bool,
    /// Guards only warn on edit instead of blocking it.
    pub warning_only: bool,
}

/// Immutable configuration injected into every component.
#[derive(Debug, Clone, PartialEq)]
pub struct ApprovalConfig {
    pub headers: HeaderNames,
    pub statuses: StatusLabels,
    pub reapproval: ReapprovalPolicy,
    pub guard: GuardPolicy,
    pub hash_chain: bool,
    pub lock_timeout: Duration,
}

impl Default for ApprovalConfig {
    fn default() -> Self {
        let headers = HeaderNames::default();
        let exempt_headers = headers.required().iter().map(|h| h.to_string()).collect();
        Self {
            headers,
            statuses: StatusLabels::default(),
            reapproval: ReapprovalPolicy {
                enabled: true,
                tracked_headers: BTreeSet::new(),
                exempt_headers,
                from_statuses: BTreeSet::from([Status::Approved]),
            },
            guard: GuardPolicy {
                lock_on_approve: true,
                warning_only: true,
            },
            hash_chain: true,
            lock_timeout: Duration::from_secs(30),
        }
    }
}
