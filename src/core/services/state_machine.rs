use chrono::Utc;

use crate::core::errors::{Result, RowList, SignoffError};
use crate::core::models::approval_config::ApprovalConfig;
use crate::core::models::audit_event::{EventDraft, Snapshot};
use crate::core::models::outcome::{DecidedRow, DecisionOutcome};
use crate::core::models::request::RowRef;
use crate::core::models::status::Status;
use crate::core::services::audit_ledger::AuditLedger;
use crate::core::services::hasher::MeaningfulHasher;
use crate::core::services::request_sheet::RequestSheet;
use crate::core::traits::ledger_store::LedgerStore;
use crate::core::traits::row_guards::RowGuards;
use crate::core::traits::row_store::RowStore;

/// Owns explicit status transitions and their side effects.
///
/// Per row: id → status → decision cells → approved hash → audit event →
/// row guard. A reset to `Pending` clears the decision cells without
/// stamping anyone as the decider.
pub struct ApprovalStateMachine<'a, S: RowStore + RowGuards, L: LedgerStore> {
    sheet: RequestSheet<'a, S>,
    ledger: AuditLedger<'a, L>,
    hasher: MeaningfulHasher<'a>,
    config: &'a ApprovalConfig,
}

impl<'a, S: RowStore + RowGuards, L: LedgerStore> ApprovalStateMachine<'a, S, L> {
    pub fn new(store: &'a S, ledger: &'a L, config: &'a ApprovalConfig) -> Self {
        Self {
            sheet: RequestSheet::new(store, config),
            ledger: AuditLedger::new(ledger, config.hash_chain),
            hasher: MeaningfulHasher::new(config),
            config,
        }
    }

    /// Move every selected row to `target`.
    ///
    /// Headers and the selection are validated before anything is written.
    /// Rows are then processed in ascending order; the first failure stops
    /// the batch without rolling back rows already done, and is reported
    /// as `BatchInterrupted` when more than one row was selected.
    pub fn decide(
        &self,
        rows: &[RowRef],
        target: Status,
        actor: &str,
        notes: &str,
    ) -> Result<DecisionOutcome> {
        let headers = self.sheet.require_headers()?;
        let hash_column = self.sheet.approved_hash_column(&headers);
        let rows = self.sheet.validate_rows(rows)?;

        let mut outcome = DecisionOutcome::default();
        for (i, &row) in rows.iter().enumerate() {
            match self.decide_row(row, target, actor, notes, hash_column) {
                Ok(decided) => outcome.rows.push(decided),
                Err(source) if rows.len() == 1 => return Err(source),
                Err(source) => {
                    return Err(SignoffError::BatchInterrupted {
                        failed_row: row.number(),
                        completed: RowList(outcome.rows.iter().map(|d| d.row.number()).collect()),
                        untouched: RowList(rows[i + 1..].iter().map(|r| r.number()).collect()),
                        source: Box::new(source),
                    });
                }
            }
        }

        tracing::info!(
            status = %target,
            actor,
            rows = outcome.rows.len(),
            "decision recorded"
        );
        Ok(outcome)
    }

    fn decide_row(
        &self,
        row: RowRef,
        target: Status,
        actor: &str,
        notes: &str,
        hash_column: Option<&str>,
    ) -> Result<DecidedRow> {
        let (_, current) = self.sheet.read(row)?;
        let request_id = self.sheet.ensure_id(row, &current.id)?;

        self.sheet.write_status(row, target)?;
        match target {
            Status::Pending => self.sheet.clear_decision(row, "")?,
            Status::Approved | Status::Rejected => {
                self.sheet.record_decision(row, actor, notes)?
            }
        }

        let (mut fields, _) = self.sheet.read(row)?;

        let mut approved_hash = None;
        if target == Status::Approved
            && let Some(column) = hash_column
        {
            let hash = self.hasher.hash(&fields);
            self.sheet.write_approved_hash(row, column, &hash)?;
            fields.insert(column.to_string(), hash.clone().into());
            approved_hash = Some(hash);
        }

        self.ledger
            .append(EventDraft {
                event_at: Utc::now(),
                actor: actor.to_string(),
                action: target.into(),
                request_id: request_id.clone(),
                row_ref: Some(row),
                snapshot_json: Snapshot::of(&fields).to_json(),
            })
            .map_err(|e| SignoffError::AuditAppendFailed {
                row: row.number(),
                detail: e.to_string(),
            })?;

        match target {
            Status::Approved if self.config.guard.lock_on_approve => {
                self.sheet.acquire_guard(row, &request_id)
            }
            Status::Approved => {}
            Status::Rejected | Status::Pending => self.sheet.release_guards(row),
        }

        Ok(DecidedRow {
            row,
            request_id,
            status: target,
            approved_hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ledger::memory_ledger_store::MemoryLedgerStore;
    use crate::adapters::sheets::memory_sheet_store::MemorySheetStore;
    use crate::core::models::audit_event::AuditAction;
    use crate::core::models::request::{Fields, cell_text};
    use crate::core::traits::row_guards::RowGuards;
    use serde_json::json;

    fn sheet_with(rows: &[&str]) -> MemorySheetStore {
        let store = MemorySheetStore::with_headers(
            [
                "RequestId",
                "Title",
                "Status",
                "Approver",
                "DecidedAt",
                "DecisionNotes",
                "ApprovedHash",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        );
        for title in rows {
            let mut f = Fields::new();
            f.insert("Title".into(), json!(title));
            f.insert("Status".into(), json!("PENDING"));
            store.append_row(&f).unwrap();
        }
        store
    }

    fn cell(store: &MemorySheetStore, row: u32, header: &str) -> String {
        cell_text(store.read_row(RowRef(row)).unwrap().get(header))
    }

    #[test]
    fn approve_assigns_id_hash_event_and_guard() {
        let cfg = ApprovalConfig::default();
        let store = sheet_with(&["Laptop"]);
        let ledger = MemoryLedgerStore::new();
        let sm = ApprovalStateMachine::new(&store, &ledger, &cfg);

        let outcome = sm.decide(&[RowRef(2)], Status::Approved, "alice", "ok").unwrap();

        let id = cell(&store, 2, "RequestId");
        assert!(!id.is_empty());
        assert_eq!(outcome.rows[0].request_id, id);
        assert_eq!(cell(&store, 2, "Status"), "APPROVED");
        assert_eq!(cell(&store, 2, "Approver"), "alice");
        assert_eq!(cell(&store, 2, "DecisionNotes"), "ok");
        assert!(!cell(&store, 2, "DecidedAt").is_empty());

        let expected_hash = MeaningfulHasher::new(&cfg).hash(&store.read_row(RowRef(2)).unwrap());
        assert_eq!(cell(&store, 2, "ApprovedHash"), expected_hash);
        assert_eq!(
            expected_hash,
            crate::core::services::hasher::digest(r#"{"Title":"Laptop"}"#)
        );

        let events = ledger.rows().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, AuditAction::Approved);
        assert_eq!(events[0].request_id, id);
        assert!(events[0].snapshot_json.contains("\"Approver\":\"alice\""));

        let guards = store.guards(RowRef(2)).unwrap();
        assert_eq!(guards.len(), 1);
        assert!(guards[0].is_ours());
        assert!(guards[0].warning_only);
    }

    #[test]
    fn reset_clears_decision_and_releases_guard() {
        let cfg = ApprovalConfig::default();
        let store = sheet_with(&["Laptop"]);
        let ledger = MemoryLedgerStore::new();
        let sm = ApprovalStateMachine::new(&store, &ledger, &cfg);

        sm.decide(&[RowRef(2)], Status::Approved, "alice", "ok").unwrap();
        let id = cell(&store, 2, "RequestId");
        sm.decide(&[RowRef(2)], Status::Pending, "bob", "ignored").unwrap();

        assert_eq!(cell(&store, 2, "RequestId"), id);
        assert_eq!(cell(&store, 2, "Status"), "PENDING");
        assert_eq!(cell(&store, 2, "Approver"), "");
        assert_eq!(cell(&store, 2, "DecidedAt"), "");
        assert_eq!(cell(&store, 2, "DecisionNotes"), "");
        assert!(store.guards(RowRef(2)).unwrap().is_empty());

        let events = ledger.rows().unwrap();
        assert_eq!(events[1].action, AuditAction::Pending);
    }

    #[test]
    fn reject_records_decision_without_hash() {
        let cfg = ApprovalConfig::default();
        let store = sheet_with(&["Laptop"]);
        let ledger = MemoryLedgerStore::new();
        let sm = ApprovalStateMachine::new(&store, &ledger, &cfg);

        let outcome = sm.decide(&[RowRef(2)], Status::Rejected, "carol", "too pricey").unwrap();
        assert_eq!(outcome.rows[0].approved_hash, None);
        assert_eq!(cell(&store, 2, "Status"), "REJECTED");
        assert_eq!(cell(&store, 2, "Approver"), "carol");
        assert_eq!(cell(&store, 2, "ApprovedHash"), "");
        assert!(store.guards(RowRef(2)).unwrap().is_empty());
    }

    #[test]
    fn no_guard_when_lock_on_approve_is_off() {
        let mut cfg = ApprovalConfig::default();
        cfg.guard.lock_on_approve = false;
        let store = sheet_with(&["Laptop"]);
        let ledger = MemoryLedgerStore::new();
        let sm = ApprovalStateMachine::new(&store, &ledger, &cfg);

        sm.decide(&[RowRef(2)], Status::Approved, "alice", "").unwrap();
        assert!(store.guards(RowRef(2)).unwrap().is_empty());
    }

    #[test]
    fn denied_guard_never_blocks_the_decision() {
        let cfg = ApprovalConfig::default();
        let store = sheet_with(&["Laptop"]);
        store.deny_guards(true);
        let ledger = MemoryLedgerStore::new();
        let sm = ApprovalStateMachine::new(&store, &ledger, &cfg);

        sm.decide(&[RowRef(2)], Status::Approved, "alice", "").unwrap();
        assert_eq!(cell(&store, 2, "Status"), "APPROVED");
        assert_eq!(ledger.rows().unwrap().len(), 1);
    }

    #[test]
    fn missing_header_aborts_before_any_write() {
        let cfg = ApprovalConfig::default();
        let store = MemorySheetStore::with_headers(vec!["Title".into(), "Status".into()]);
        let mut f = Fields::new();
        f.insert("Title".into(), json!("Laptop"));
        store.append_row(&f).unwrap();
        let ledger = MemoryLedgerStore::new();
        let sm = ApprovalStateMachine::new(&store, &ledger, &cfg);

        let err = sm.decide(&[RowRef(2)], Status::Approved, "alice", "").unwrap_err();
        assert!(matches!(err, SignoffError::MissingHeader { .. }));
        assert_eq!(cell(&store, 2, "Status"), "");
        assert!(ledger.rows().unwrap().is_empty());
    }

    #[test]
    fn empty_selection_is_rejected() {
        let cfg = ApprovalConfig::default();
        let store = sheet_with(&["Laptop"]);
        let ledger = MemoryLedgerStore::new();
        let sm = ApprovalStateMachine::new(&store, &ledger, &cfg);

        assert!(matches!(
            sm.decide(&[], Status::Approved, "alice", ""),
            Err(SignoffError::NoRowsSelected)
        ));
    }

    #[test]
    fn mid_batch_failure_reports_done_and_untouched_rows() {
        let cfg = ApprovalConfig::default();
        let store = sheet_with(&["A", "B", "C", "D", "E"]);
        store.fail_writes_on(Some(RowRef(4)));
        let ledger = MemoryLedgerStore::new();
        let sm = ApprovalStateMachine::new(&store, &ledger, &cfg);

        let rows: Vec<RowRef> = (2..=6).map(RowRef).collect();
        let err = sm.decide(&rows, Status::Approved, "alice", "").unwrap_err();

        match err {
            SignoffError::BatchInterrupted {
                failed_row,
                completed,
                untouched,
                ..
            } => {
                assert_eq!(failed_row, 4);
                assert_eq!(completed, RowList(vec![2, 3]));
                assert_eq!(untouched, RowList(vec![5, 6]));
            }
            other => panic!("unexpected error: {other}"),
        }

        assert_eq!(cell(&store, 2, "Status"), "APPROVED");
        assert_eq!(cell(&store, 3, "Status"), "APPROVED");
        assert_eq!(cell(&store, 5, "Status"), "PENDING");
        assert_eq!(cell(&store, 6, "Status"), "PENDING");
        assert_eq!(ledger.rows().unwrap().len(), 2);
    }

    #[test]
    fn audit_failure_flags_the_row_inconsistent() {
        let cfg = ApprovalConfig::default();
        let store = sheet_with(&["Laptop"]);
        let ledger = MemoryLedgerStore::new();
        ledger.fail_appends(true);
        let sm = ApprovalStateMachine::new(&store, &ledger, &cfg);

        let err = sm.decide(&[RowRef(2)], Status::Approved, "alice", "").unwrap_err();
        assert!(matches!(err, SignoffError::AuditAppendFailed { row: 2, .. }));
        assert!(store.guards(RowRef(2)).unwrap().is_empty());
    }

    #[test]
    fn unchained_config_appends_plain_events() {
        let cfg = ApprovalConfig {
            hash_chain: false,
            ..ApprovalConfig::default()
        };
        let store = sheet_with(&["Laptop"]);
        let ledger = MemoryLedgerStore::new();
        let sm = ApprovalStateMachine::new(&store, &ledger, &cfg);

        sm.decide(&[RowRef(2)], Status::Approved, "alice", "").unwrap();
        assert_eq!(ledger.rows().unwrap()[0].chain_hash, None);
    }
}
