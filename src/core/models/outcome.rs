use serde::Serialize;

use crate::core::models::request::RowRef;
use crate::core::models::status::Status;

/// One row recorded by `decide`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecidedRow {
    pub row: RowRef,
    pub request_id: String,
    pub status: Status,
    pub approved_hash: Option<String>,
}

/// Result of a `decide` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DecisionOutcome {
    pub rows: Vec<DecidedRow>,
}

/// Result of delivering an edit notification.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReapprovalOutcome {
    /// Edited columns that count as meaningful. Empty means the edit was
    /// ignored entirely.
    pub meaningful_headers: Vec<String>,
    pub reopened: Vec<RowRef>,
}

/// Result of a drift scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftReport {
    pub hashes_initialized: usize,
    pub reopened: usize,
    pub reopened_rows: Vec<RowRef>,
}

/// Row counts by state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    /// Rows whose status cell is blank or unrecognized.
    pub unset: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.pending + self.approved + self.rejected + self.unset
    }

    pub fn record(&mut self, status: Option<Status>) {
        match status {
            Some(Status::Pending) => self.pending += 1,
            Some(Status::Approved) => self.approved += 1,
            Some(Status::Rejected) => self.rejected += 1,
            None => self.unset += 1,
        }
    }
}
