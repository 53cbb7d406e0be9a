use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::models::request::{Fields, RowRef};
use crate::core::models::status::Status;

/// Actions that get recorded in the audit ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Approved,
    Rejected,
    Pending,
    ReapprovalRequired,
    ApprovalHashSet,
    /// Operator-triggered project setup.
    Setup,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Approved => "APPROVED",
            AuditAction::Rejected => "REJECTED",
            AuditAction::Pending => "PENDING",
            AuditAction::ReapprovalRequired => "REAPPROVAL_REQUIRED",
            AuditAction::ApprovalHashSet => "APPROVAL_HASH_SET",
            AuditAction::Setup => "SETUP",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Status> for AuditAction {
    fn from(status: Status) -> Self {
        match status {
            Status::Pending => AuditAction::Pending,
            Status::Approved => AuditAction::Approved,
            Status::Rejected => AuditAction::Rejected,
        }
    }
}

/// One immutable row of the audit ledger.
///
/// `prev_chain_hash` and `chain_hash` are only present when the event was
/// appended with chaining enabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub event_at: DateTime<Utc>,
    pub actor: String,
    pub action: AuditAction,
    pub request_id: String,
    pub row_ref: Option<RowRef>,
    pub snapshot_json: String,
    pub snapshot_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_chain_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_hash: Option<String>,
}

/// An event before the ledger has hashed and chained it.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub event_at: DateTime<Utc>,
    pub actor: String,
    pub action: AuditAction,
    pub request_id: String,
    pub row_ref: Option<RowRef>,
    pub snapshot_json: String,
}

/// Row state at event time plus optional transition metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot<'a> {
    pub fields: &'a Fields,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition: Option<Value>,
}

impl<'a> Snapshot<'a> {
    pub fn of(fields: &'a Fields) -> Self {
        Self {
            fields,
            transition: None,
        }
    }

    pub fn with_transition(fields: &'a Fields, transition: Value) -> Self {
        Self {
            fields,
            transition: Some(transition),
        }
    }

    pub fn to_json(&self) -> String {
        // Map keys are strings and values are already JSON.
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}
