use chrono::Utc;
use serde_json::{Value, json};

use crate::core::errors::{Result, SignoffError};
use crate::core::models::approval_config::ApprovalConfig;
use crate::core::models::audit_event::{AuditAction, AuditEvent, EventDraft, Snapshot};
use crate::core::models::chain_report::ChainReport;
use crate::core::models::outcome::{DecisionOutcome, DriftReport, ReapprovalOutcome, StatusCounts};
use crate::core::models::request::{Fields, RowRange, RowRef};
use crate::core::models::status::Status;
use crate::core::services::audit_ledger::AuditLedger;
use crate::core::services::drift_scanner::DriftScanner;
use crate::core::services::reapproval::{ReapprovalTrigger, edited_row};
use crate::core::services::request_sheet::RequestSheet;
use crate::core::services::state_machine::ApprovalStateMachine;
use crate::core::traits::ledger_store::LedgerStore;
use crate::core::traits::lock::OperationLock;
use crate::core::traits::row_guards::RowGuards;
use crate::core::traits::row_store::RowStore;

/// Entry points for external callers.
///
/// Every operation that mutates requests or appends to the ledger runs
/// under the operation lock, so chain computation, decisions and
/// edit-triggered reapprovals never interleave.
pub struct Approvals<S, L, K>
where
    S: RowStore + RowGuards,
    L: LedgerStore,
    K: OperationLock,
{
    store: S,
    ledger: L,
    lock: K,
    config: ApprovalConfig,
}

impl<S, L, K> Approvals<S, L, K>
where
    S: RowStore + RowGuards,
    L: LedgerStore,
    K: OperationLock,
{
    pub fn new(store: S, ledger: L, lock: K, config: ApprovalConfig) -> Self {
        Self {
            store,
            ledger,
            lock,
            config,
        }
    }

    pub fn config(&self) -> &ApprovalConfig {
        &self.config
    }

    pub fn ledger_store(&self) -> &L {
        &self.ledger
    }

    /// Explicit operator decision on a set of rows.
    pub fn decide(
        &self,
        rows: &[RowRef],
        status: Status,
        actor: &str,
        notes: &str,
    ) -> Result<DecisionOutcome> {
        self.lock.run_exclusive(|| {
            ApprovalStateMachine::new(&self.store, &self.ledger, &self.config)
                .decide(rows, status, actor, notes)
        })
    }

    /// Edit notification from the row store.
    pub fn on_external_edit(
        &self,
        edited_headers: &[String],
        rows: RowRange,
        actor: &str,
    ) -> Result<ReapprovalOutcome> {
        self.lock.run_exclusive(|| {
            ReapprovalTrigger::new(&self.store, &self.ledger, &self.config)
                .on_external_edit(edited_headers, rows, actor)
        })
    }

    /// Write `fields` into one row and deliver the edit notification,
    /// as a single locked operation.
    ///
    /// Unknown columns and rows outside the data range are rejected before
    /// any cell is written.
    pub fn apply_edit(
        &self,
        row: RowRef,
        fields: &Fields,
        actor: &str,
    ) -> Result<ReapprovalOutcome> {
        self.lock.run_exclusive(|| {
            let sheet = RequestSheet::new(&self.store, &self.config);
            let last = sheet.last_row_index()?;
            let range = edited_row(row)
                .filter(|_| row.number() <= last)
                .ok_or(SignoffError::RowOutOfRange {
                    row: row.number(),
                    last,
                })?;
            sheet.require_columns(fields)?;

            for (header, value) in fields {
                self.store.write_cell(row, header, value.clone())?;
            }
            tracing::info!(%row, cells = fields.len(), "row edited");

            let edited: Vec<String> = fields.keys().cloned().collect();
            ReapprovalTrigger::new(&self.store, &self.ledger, &self.config)
                .on_external_edit(&edited, range, actor)
        })
    }

    /// Append a request row. The status defaults to the pending label.
    pub fn add_request(&self, fields: &Fields) -> Result<RowRef> {
        self.lock.run_exclusive(|| {
            let sheet = RequestSheet::new(&self.store, &self.config);
            sheet.require_columns(fields)?;

            let pending = self.config.statuses.label(Status::Pending);
            let mut fields = fields.clone();
            fields
                .entry(self.config.headers.status.clone())
                .or_insert_with(|| Value::String(pending.to_string()));
            let row = self.store.append_row(&fields)?;
            tracing::info!(%row, "request added");
            Ok(row)
        })
    }

    pub fn scan_for_drift(&self, actor: &str) -> Result<DriftReport> {
        self.lock.run_exclusive(|| {
            DriftScanner::new(&self.store, &self.ledger, &self.config).scan(actor)
        })
    }

    /// Record the operator-triggered setup of a request sheet.
    pub fn setup(&self, actor: &str) -> Result<AuditEvent> {
        self.lock.run_exclusive(|| {
            let headers = RequestSheet::new(&self.store, &self.config).require_headers()?;
            let fields = Fields::new();
            let transition = json!({
                "reason": "setup",
                "headers": headers,
                "hashChain": self.config.hash_chain,
            });
            AuditLedger::new(&self.ledger, self.config.hash_chain).append(EventDraft {
                event_at: Utc::now(),
                actor: actor.to_string(),
                action: AuditAction::Setup,
                request_id: String::new(),
                row_ref: None,
                snapshot_json: Snapshot::with_transition(&fields, transition).to_json(),
            })
        })
    }

    /// Recompute the audit chain. Read-only, so it does not take the lock.
    pub fn verify_chain(&self) -> Result<ChainReport> {
        AuditLedger::new(&self.ledger, self.config.hash_chain).verify()
    }

    /// Request counts by status.
    pub fn summary(&self) -> Result<StatusCounts> {
        let sheet = RequestSheet::new(&self.store, &self.config);
        sheet.require_headers()?;
        let mut counts = StatusCounts::default();
        for row in sheet.data_rows()? {
            let (_, request) = sheet.read(row)?;
            counts.record(request.status);
        }
        Ok(counts)
    }
}
