use chrono::Utc;
use serde_json::json;

use crate::core::errors::{Result, SignoffError};
use crate::core::models::approval_config::ApprovalConfig;
use crate::core::models::audit_event::{AuditAction, EventDraft, Snapshot};
use crate::core::models::outcome::DriftReport;
use crate::core::models::status::Status;
use crate::core::services::reapproval::ReapprovalTrigger;
use crate::core::traits::ledger_store::LedgerStore;
use crate::core::traits::row_guards::RowGuards;
use crate::core::traits::row_store::RowStore;

/// Batch reconciliation of approved rows against their approval hash.
///
/// Catches edits that never produced an edit notification (bulk imports,
/// other automation, direct writes). Only `Approved` rows are scanned.
pub struct DriftScanner<'a, S: RowStore + RowGuards, L: LedgerStore> {
    trigger: ReapprovalTrigger<'a, S, L>,
    config: &'a ApprovalConfig,
}

impl<'a, S: RowStore + RowGuards, L: LedgerStore> DriftScanner<'a, S, L> {
    pub fn new(store: &'a S, ledger: &'a L, config: &'a ApprovalConfig) -> Self {
        Self {
            trigger: ReapprovalTrigger::new(store, ledger, config),
            config,
        }
    }

    /// Scan every row once.
    ///
    /// A blank approved hash is initialized (not a finding); a differing
    /// one reopens the request exactly like a meaningful edit would.
    /// Scanning twice with no edits in between changes nothing the second
    /// time.
    pub fn scan(&self, actor: &str) -> Result<DriftReport> {
        let sheet = self.trigger.sheet();
        let headers = sheet.require_headers()?;
        let hash_column = match &self.config.headers.approved_hash {
            None => {
                return Err(SignoffError::InvalidConfig {
                    detail: "drift scan needs an approved hash column ([headers] approved_hash)"
                        .into(),
                });
            }
            Some(name) => sheet
                .approved_hash_column(&headers)
                .ok_or_else(|| SignoffError::MissingHeader {
                    header: name.clone(),
                })?,
        };

        let mut report = DriftReport::default();
        for row in sheet.data_rows()? {
            let (mut fields, request) = sheet.read(row)?;
            if request.status != Some(Status::Approved) {
                continue;
            }

            let request_id = sheet.ensure_id(row, &request.id)?;
            if request_id != request.id {
                fields.insert(self.config.headers.id.clone(), request_id.clone().into());
            }
            let computed = self.trigger.hasher().hash(&fields);

            match request.approved_hash.as_deref() {
                None => {
                    sheet.write_approved_hash(row, hash_column, &computed)?;
                    fields.insert(hash_column.to_string(), computed.clone().into());
                    let transition = json!({
                        "reason": "hash_initialized",
                        "approvedHash": computed,
                    });
                    self.trigger
                        .ledger()
                        .append(EventDraft {
                            event_at: Utc::now(),
                            actor: actor.to_string(),
                            action: AuditAction::ApprovalHashSet,
                            request_id,
                            row_ref: Some(row),
                            snapshot_json: Snapshot::with_transition(&fields, transition).to_json(),
                        })
                        .map_err(|e| SignoffError::AuditAppendFailed {
                            row: row.number(),
                            detail: e.to_string(),
                        })?;
                    report.hashes_initialized += 1;
                }
                Some(stored) if stored != computed => {
                    let transition = json!({
                        "reason": "hash_mismatch",
                        "priorStatus": Status::Approved,
                        "storedHash": stored,
                        "computedHash": computed,
                    });
                    let notes = format!(
                        "Auto: reapproval required (was {}; approval hash mismatch)",
                        Status::Approved
                    );
                    let mut request = request.clone();
                    request.id = request_id;
                    self.trigger
                        .reopen(&request, Status::Approved, &notes, transition, actor)?;
                    tracing::warn!(%row, stored = %stored, computed = %computed, "approved request drifted; reopened");
                    report.reopened += 1;
                    report.reopened_rows.push(row);
                }
                Some(_) => {}
            }
        }

        tracing::info!(
            hashes_initialized = report.hashes_initialized,
            reopened = report.reopened,
            "drift scan finished"
        );
        Ok(report)
    }
}
