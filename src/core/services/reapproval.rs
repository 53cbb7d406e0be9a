use chrono::Utc;
use serde_json::{Value, json};

use crate::core::errors::{Result, SignoffError};
use crate::core::models::approval_config::ApprovalConfig;
use crate::core::models::audit_event::{AuditAction, EventDraft, Snapshot};
use crate::core::models::outcome::ReapprovalOutcome;
use crate::core::models::request::{Request, RowRange, RowRef};
use crate::core::models::status::Status;
use crate::core::services::audit_ledger::AuditLedger;
use crate::core::services::hasher::MeaningfulHasher;
use crate::core::services::request_sheet::RequestSheet;
use crate::core::traits::ledger_store::LedgerStore;
use crate::core::traits::row_guards::RowGuards;
use crate::core::traits::row_store::RowStore;

/// Reopens decided requests whose meaningful columns were edited.
pub struct ReapprovalTrigger<'a, S: RowStore + RowGuards, L: LedgerStore> {
    sheet: RequestSheet<'a, S>,
    ledger: AuditLedger<'a, L>,
    hasher: MeaningfulHasher<'a>,
    config: &'a ApprovalConfig,
}

impl<'a, S: RowStore + RowGuards, L: LedgerStore> ReapprovalTrigger<'a, S, L> {
    pub fn new(store: &'a S, ledger: &'a L, config: &'a ApprovalConfig) -> Self {
        Self {
            sheet: RequestSheet::new(store, config),
            ledger: AuditLedger::new(ledger, config.hash_chain),
            hasher: MeaningfulHasher::new(config),
            config,
        }
    }

    /// Handle an edit of `edited_headers` across `rows`.
    ///
    /// Fires only when at least one edited column is meaningful, and only
    /// for rows whose status is in the configured reopen set. Running it
    /// again on the same edit is a no-op because reopened rows are
    /// `Pending`.
    pub fn on_external_edit(
        &self,
        edited_headers: &[String],
        rows: RowRange,
        actor: &str,
    ) -> Result<ReapprovalOutcome> {
        let policy = &self.config.reapproval;
        if !policy.enabled {
            return Ok(ReapprovalOutcome::default());
        }

        let headers = self.sheet.require_headers()?;
        let meaningful = self.hasher.meaningful_subset(
            edited_headers
                .iter()
                .map(String::as_str)
                .filter(|h| headers.iter().any(|x| x == h)),
        );
        if meaningful.is_empty() {
            tracing::debug!(edited = ?edited_headers, "edit touches no meaningful column");
            return Ok(ReapprovalOutcome::default());
        }

        let last = self.sheet.last_row_index()?;
        let mut outcome = ReapprovalOutcome {
            meaningful_headers: meaningful.clone(),
            reopened: Vec::new(),
        };

        for row in rows.data_rows(last) {
            let (_, request) = self.sheet.read(row)?;
            let Some(prior) = request.status else {
                continue;
            };
            if !policy.from_statuses.contains(&prior) {
                continue;
            }

            let notes = format!(
                "Auto: reapproval required (was {prior}; edited: {})",
                meaningful.join(", ")
            );
            let transition = json!({
                "reason": "meaningful_edit",
                "priorStatus": prior,
                "editedHeaders": meaningful,
            });
            self.reopen(&request, prior, &notes, transition, actor)?;
            outcome.reopened.push(row);
        }

        if !outcome.reopened.is_empty() {
            tracing::info!(
                reopened = outcome.reopened.len(),
                headers = ?outcome.meaningful_headers,
                "meaningful edit reopened requests"
            );
        }
        Ok(outcome)
    }

    /// Send one request back to `Pending` with an automatic note, record a
    /// `REAPPROVAL_REQUIRED` event and drop the row guard.
    pub(crate) fn reopen(
        &self,
        request: &Request,
        prior: Status,
        notes: &str,
        transition: Value,
        actor: &str,
    ) -> Result<()> {
        let row = request.row;
        let request_id = self.sheet.ensure_id(row, &request.id)?;
        self.sheet.write_status(row, Status::Pending)?;
        self.sheet.clear_decision(row, notes)?;

        let (fields, _) = self.sheet.read(row)?;
        self.ledger
            .append(EventDraft {
                event_at: Utc::now(),
                actor: actor.to_string(),
                action: AuditAction::ReapprovalRequired,
                request_id,
                row_ref: Some(row),
                snapshot_json: Snapshot::with_transition(&fields, transition).to_json(),
            })
            .map_err(|e| SignoffError::AuditAppendFailed {
                row: row.number(),
                detail: e.to_string(),
            })?;

        self.sheet.release_guards(row);
        Ok(())
    }

    pub(crate) fn sheet(&self) -> &RequestSheet<'a, S> {
        &self.sheet
    }

    pub(crate) fn ledger(&self) -> &AuditLedger<'a, L> {
        &self.ledger
    }

    pub(crate) fn hasher(&self) -> &MeaningfulHasher<'a> {
        &self.hasher
    }
}

/// Range for an edit of one row; `None` for the header row.
pub fn edited_row(row: RowRef) -> Option<RowRange> {
    row.is_data().then(|| RowRange::single(row))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ledger::memory_ledger_store::MemoryLedgerStore;
    use crate::adapters::sheets::memory_sheet_store::MemorySheetStore;
    use crate::core::models::request::{Fields, cell_text};
    use crate::core::services::state_machine::ApprovalStateMachine;
    use std::collections::BTreeSet;

    fn approved_sheet(cfg: &ApprovalConfig, ledger: &MemoryLedgerStore) -> MemorySheetStore {
        let store = MemorySheetStore::with_headers(
            [
                "RequestId",
                "Status",
                "Approver",
                "DecidedAt",
                "DecisionNotes",
                "ApprovedHash",
                "Title",
                "Amount",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        );
        let mut f = Fields::new();
        f.insert("Title".into(), json!("Laptop"));
        f.insert("Amount".into(), json!("1200"));
        store.append_row(&f).unwrap();
        ApprovalStateMachine::new(&store, ledger, cfg)
            .decide(&[RowRef(2)], Status::Approved, "alice", "ok")
            .unwrap();
        store
    }

    fn edit(store: &MemorySheetStore, header: &str, value: &str) -> Vec<String> {
        store.write_cell(RowRef(2), header, json!(value)).unwrap();
        vec![header.to_string()]
    }

    fn cell(store: &MemorySheetStore, header: &str) -> String {
        cell_text(store.read_row(RowRef(2)).unwrap().get(header))
    }

    #[test]
    fn meaningful_edit_reopens_approved_row() {
        let cfg = ApprovalConfig::default();
        let ledger = MemoryLedgerStore::new();
        let store = approved_sheet(&cfg, &ledger);
        let trigger = ReapprovalTrigger::new(&store, &ledger, &cfg);

        let edited = edit(&store, "Title", "Desktop");
        let outcome = trigger
            .on_external_edit(&edited, RowRange::single(RowRef(2)), "bob")
            .unwrap();

        assert_eq!(outcome.reopened, vec![RowRef(2)]);
        assert_eq!(cell(&store, "Status"), "PENDING");
        assert_eq!(cell(&store, "Approver"), "");
        assert_eq!(cell(&store, "DecidedAt"), "");
        assert!(cell(&store, "DecisionNotes").contains("was APPROVED"));
        assert!(cell(&store, "DecisionNotes").contains("Title"));
        assert!(store.guards(RowRef(2)).unwrap().is_empty());

        let events = ledger.rows().unwrap();
        assert_eq!(events.len(), 2);
        let last = &events[1];
        assert_eq!(last.action, AuditAction::ReapprovalRequired);
        assert_eq!(last.actor, "bob");
        assert!(last.snapshot_json.contains("\"priorStatus\":\"APPROVED\""));
        assert!(last.snapshot_json.contains("\"editedHeaders\":[\"Title\"]"));
    }

    #[test]
    fn second_delivery_of_same_edit_is_noop() {
        let cfg = ApprovalConfig::default();
        let ledger = MemoryLedgerStore::new();
        let store = approved_sheet(&cfg, &ledger);
        let trigger = ReapprovalTrigger::new(&store, &ledger, &cfg);

        let edited = edit(&store, "Title", "Desktop");
        trigger
            .on_external_edit(&edited, RowRange::single(RowRef(2)), "bob")
            .unwrap();
        let again = trigger
            .on_external_edit(&edited, RowRange::single(RowRef(2)), "bob")
            .unwrap();

        assert!(again.reopened.is_empty());
        assert_eq!(ledger.rows().unwrap().len(), 2);
    }

    #[test]
    fn exempt_edit_never_fires() {
        let cfg = ApprovalConfig::default();
        let ledger = MemoryLedgerStore::new();
        let store = approved_sheet(&cfg, &ledger);
        let trigger = ReapprovalTrigger::new(&store, &ledger, &cfg);

        let edited = edit(&store, "Approver", "mallory");
        let outcome = trigger
            .on_external_edit(&edited, RowRange::single(RowRef(2)), "bob")
            .unwrap();

        assert!(outcome.meaningful_headers.is_empty());
        assert_eq!(cell(&store, "Status"), "APPROVED");
        assert_eq!(ledger.rows().unwrap().len(), 1);
    }

    #[test]
    fn untracked_edit_is_ignored_when_tracking_is_set() {
        let mut cfg = ApprovalConfig::default();
        cfg.reapproval.tracked_headers = BTreeSet::from(["Amount".to_string()]);
        let ledger = MemoryLedgerStore::new();
        let store = approved_sheet(&cfg, &ledger);
        let trigger = ReapprovalTrigger::new(&store, &ledger, &cfg);

        let edited = edit(&store, "Title", "Desktop");
        let outcome = trigger
            .on_external_edit(&edited, RowRange::single(RowRef(2)), "bob")
            .unwrap();
        assert!(outcome.reopened.is_empty());

        let edited = edit(&store, "Amount", "9000");
        let outcome = trigger
            .on_external_edit(&edited, RowRange::single(RowRef(2)), "bob")
            .unwrap();
        assert_eq!(outcome.reopened, vec![RowRef(2)]);
    }

    #[test]
    fn rejected_rows_stay_unless_configured() {
        let cfg = ApprovalConfig::default();
        let ledger = MemoryLedgerStore::new();
        let store = approved_sheet(&cfg, &ledger);
        ApprovalStateMachine::new(&store, &ledger, &cfg)
            .decide(&[RowRef(2)], Status::Rejected, "alice", "no")
            .unwrap();

        let edited = edit(&store, "Title", "Desktop");
        let outcome = ReapprovalTrigger::new(&store, &ledger, &cfg)
            .on_external_edit(&edited, RowRange::single(RowRef(2)), "bob")
            .unwrap();
        assert!(outcome.reopened.is_empty());
        assert_eq!(cell(&store, "Status"), "REJECTED");

        let mut widened = cfg.clone();
        widened.reapproval.from_statuses = BTreeSet::from([Status::Approved, Status::Rejected]);
        let outcome = ReapprovalTrigger::new(&store, &ledger, &widened)
            .on_external_edit(&edited, RowRange::single(RowRef(2)), "bob")
            .unwrap();
        assert_eq!(outcome.reopened, vec![RowRef(2)]);
        assert!(cell(&store, "DecisionNotes").contains("was REJECTED"));
    }

    #[test]
    fn disabled_policy_does_nothing() {
        let mut cfg = ApprovalConfig::default();
        let ledger = MemoryLedgerStore::new();
        let store = approved_sheet(&cfg, &ledger);
        cfg.reapproval.enabled = false;

        let edited = edit(&store, "Title", "Desktop");
        let outcome = ReapprovalTrigger::new(&store, &ledger, &cfg)
            .on_external_edit(&edited, RowRange::single(RowRef(2)), "bob")
            .unwrap();
        assert!(outcome.reopened.is_empty());
        assert_eq!(cell(&store, "Status"), "APPROVED");
    }

    #[test]
    fn header_row_edits_are_ignored() {
        assert_eq!(edited_row(RowRef(1)), None);
        assert_eq!(edited_row(RowRef(3)), Some(RowRange::single(RowRef(3))));
    }
}
