use crate::core::errors::Result;
use crate::core::models::audit_event::{AuditEvent, EventDraft};
use crate::core::models::chain_report::{ChainBreak, ChainBreakKind, ChainReport};
use crate::core::services::hasher::digest;
use crate::core::traits::ledger_store::LedgerStore;

/// Chain hash binding an event to everything before it:
/// `H(prev ‖ "\n" ‖ snapshot_hash)`.
pub fn chain_hash(prev_chain_hash: &str, snapshot_hash: &str) -> String {
    digest(&format!("{prev_chain_hash}\n{snapshot_hash}"))
}

/// Append-only audit log with optional hash chaining.
///
/// `append` reads the last chain hash and then writes; callers must hold
/// the operation lock so no other append runs in between.
pub struct AuditLedger<'a, L: LedgerStore> {
    store: &'a L,
    chained: bool,
}

impl<'a, L: LedgerStore> AuditLedger<'a, L> {
    pub fn new(store: &'a L, chained: bool) -> Self {
        Self { store, chained }
    }

    /// Hash, chain and persist one event.
    pub fn append(&self, draft: EventDraft) -> Result<AuditEvent> {
        let snapshot_hash = digest(&draft.snapshot_json);

        let (prev_chain_hash, chain) = if self.chained {
            let prev = self
                .store
                .last_row()?
                .and_then(|e| e.chain_hash)
                .unwrap_or_default();
            let chain = chain_hash(&prev, &snapshot_hash);
            (Some(prev), Some(chain))
        } else {
            (None, None)
        };

        let event = AuditEvent {
            event_at: draft.event_at,
            actor: draft.actor,
            action: draft.action,
            request_id: draft.request_id,
            row_ref: draft.row_ref,
            snapshot_json: draft.snapshot_json,
            snapshot_hash,
            prev_chain_hash,
            chain_hash: chain,
        };

        self.store.append_row(&event)?;
        tracing::debug!(
            action = %event.action,
            request_id = %event.request_id,
            chained = self.chained,
            "audit event appended"
        );
        Ok(event)
    }

    /// Recompute the whole stored ledger.
    pub fn verify(&self) -> Result<ChainReport> {
        Ok(verify_chain(&self.store.rows()?, self.chained))
    }
}

/// Recompute snapshot digests and the chain from the genesis hash `""`.
///
/// The running hash is always the recomputed one, so a value altered at
/// position `i` is reported at `i` and at every later chained position.
/// Unchained events reset the running hash to `""`, as `append` does.
///
/// With `expect_chained`, unchained events after the last chained one are
/// reported: nothing later links to them, so they would otherwise pass
/// unchecked.
pub fn verify_chain(events: &[AuditEvent], expect_chained: bool) -> ChainReport {
    let mut report = ChainReport {
        events_checked: events.len(),
        ..ChainReport::default()
    };
    let mut running = String::new();
    let unlinked_tail = events
        .iter()
        .rposition(|e| e.chain_hash.is_some())
        .map_or(0, |i| i + 1);

    for (i, event) in events.iter().enumerate() {
        let position = i + 1;
        let mut found: Option<ChainBreakKind> = None;

        let recomputed_snapshot = digest(&event.snapshot_json);
        if recomputed_snapshot != event.snapshot_hash {
            found = Some(ChainBreakKind::SnapshotHashMismatch {
                expected: recomputed_snapshot,
                actual: event.snapshot_hash.clone(),
            });
        }

        match &event.chain_hash {
            Some(stored) => {
                report.chained_events += 1;
                let prev = event.prev_chain_hash.as_deref().unwrap_or_default();
                let expected = chain_hash(&running, &event.snapshot_hash);

                if found.is_none() && prev != running {
                    found = Some(ChainBreakKind::PrevLinkMismatch {
                        expected: running.clone(),
                        actual: prev.to_string(),
                    });
                }
                if found.is_none() && *stored != expected {
                    found = Some(ChainBreakKind::ChainHashMismatch {
                        expected: expected.clone(),
                        actual: stored.clone(),
                    });
                }
                running = expected;
            }
            None => {
                running.clear();
                if expect_chained && i >= unlinked_tail && found.is_none() {
                    found = Some(ChainBreakKind::MissingChain);
                }
            }
        }

        if let Some(kind) = found {
            report.breaks.push(ChainBreak { position, kind });
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ledger::memory_ledger_store::MemoryLedgerStore;
    use crate::core::models::audit_event::AuditAction;
    use chrono::Utc;

    fn draft(n: usize) -> EventDraft {
        EventDraft {
            event_at: Utc::now(),
            actor: "alice".into(),
            action: AuditAction::Approved,
            request_id: format!("REQ-{n}"),
            row_ref: None,
            snapshot_json: format!(r#"{{"fields":{{"n":{n}}}}}"#),
        }
    }

    fn chained_ledger(n: usize) -> Vec<AuditEvent> {
        let store = MemoryLedgerStore::new();
        let ledger = AuditLedger::new(&store, true);
        for i in 1..=n {
            ledger.append(draft(i)).unwrap();
        }
        store.rows().unwrap()
    }

    #[test]
    fn first_event_links_to_genesis() {
        let events = chained_ledger(2);
        let h1 = &events[0].snapshot_hash;
        let h2 = &events[1].snapshot_hash;

        let c1 = digest(&format!("\n{h1}"));
        let c2 = digest(&format!("{c1}\n{h2}"));

        assert_eq!(events[0].prev_chain_hash.as_deref(), Some(""));
        assert_eq!(events[0].chain_hash.as_deref(), Some(c1.as_str()));
        assert_eq!(events[1].prev_chain_hash.as_deref(), Some(c1.as_str()));
        assert_eq!(events[1].chain_hash.as_deref(), Some(c2.as_str()));
    }

    #[test]
    fn untouched_chain_verifies() {
        let report = verify_chain(&chained_ledger(5), true);
        assert!(report.is_intact());
        assert_eq!(report.events_checked, 5);
        assert_eq!(report.chained_events, 5);
    }

    #[test]
    fn tampered_snapshot_hash_breaks_every_later_event() {
        let mut events = chained_ledger(4);
        events[1].snapshot_hash = digest("forged");

        let report = verify_chain(&events, true);
        let positions: Vec<usize> = report.breaks.iter().map(|b| b.position).collect();
        assert_eq!(positions, vec![2, 3, 4]);
        assert_eq!(report.first_break(), Some(2));
    }

    #[test]
    fn tampering_first_event_fails_from_event_one() {
        let mut events = chained_ledger(2);
        events[0].snapshot_hash = digest("forged");

        let report = verify_chain(&events, true);
        assert_eq!(report.first_break(), Some(1));
        assert_eq!(report.breaks.len(), 2);
    }

    #[test]
    fn edited_snapshot_json_is_detected() {
        let mut events = chained_ledger(3);
        events[2].snapshot_json = r#"{"fields":{"n":999}}"#.into();

        let report = verify_chain(&events, true);
        assert_eq!(report.breaks.len(), 1);
        assert!(matches!(
            report.breaks[0].kind,
            ChainBreakKind::SnapshotHashMismatch { .. }
        ));
    }

    #[test]
    fn deleted_event_is_detected() {
        let mut events = chained_ledger(3);
        events.remove(1);

        let report = verify_chain(&events, true);
        assert_eq!(report.first_break(), Some(2));
        assert!(matches!(
            report.breaks[0].kind,
            ChainBreakKind::PrevLinkMismatch { .. }
        ));
    }

    #[test]
    fn unchained_ledger_stores_no_chain_columns() {
        let store = MemoryLedgerStore::new();
        let ledger = AuditLedger::new(&store, false);
        let event = ledger.append(draft(1)).unwrap();

        assert_eq!(event.prev_chain_hash, None);
        assert_eq!(event.chain_hash, None);
        assert_eq!(event.snapshot_hash, digest(&event.snapshot_json));
        assert!(ledger.verify().unwrap().is_intact());
    }

    #[test]
    fn chain_restarts_after_unchained_event() {
        let store = MemoryLedgerStore::new();
        AuditLedger::new(&store, true).append(draft(1)).unwrap();
        AuditLedger::new(&store, false).append(draft(2)).unwrap();
        let third = AuditLedger::new(&store, true).append(draft(3)).unwrap();

        assert_eq!(third.prev_chain_hash.as_deref(), Some(""));
        let report = verify_chain(&store.rows().unwrap(), true);
        assert!(report.is_intact());
        assert_eq!(report.chained_events, 2);
    }

    #[test]
    fn stripped_tail_event_is_reported_when_chaining() {
        let mut events = chained_ledger(3);
        events[2].prev_chain_hash = None;
        events[2].chain_hash = None;

        let report = verify_chain(&events, true);
        assert_eq!(report.first_break(), Some(3));
        assert_eq!(report.breaks[0].kind, ChainBreakKind::MissingChain);
        assert_eq!(report.chained_events, 2);

        assert!(verify_chain(&events, false).is_intact());
    }

    #[test]
    fn unchained_ledger_fails_once_chaining_is_on() {
        let store = MemoryLedgerStore::new();
        AuditLedger::new(&store, false).append(draft(1)).unwrap();
        AuditLedger::new(&store, false).append(draft(2)).unwrap();

        assert!(AuditLedger::new(&store, false).verify().unwrap().is_intact());
        let report = AuditLedger::new(&store, true).verify().unwrap();
        assert_eq!(report.breaks.len(), 2);
    }
}
