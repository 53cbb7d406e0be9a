use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::core::errors::{Result, SignoffError};
use crate::core::models::audit_event::AuditEvent;
use crate::core::traits::ledger_store::LedgerStore;

/// Ledger held in memory. Used by tests and dry runs.
#[derive(Default)]
pub struct MemoryLedgerStore {
    events: Mutex<Vec<AuditEvent>>,
    fail_appends: AtomicBool,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent append fail.
    pub fn fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn append_row(&self, event: &AuditEvent) -> Result<()> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(SignoffError::Audit {
                detail: "ledger is unavailable".into(),
            });
        }
        self.events.lock().push(event.clone());
        Ok(())
    }

    fn last_row(&self) -> Result<Option<AuditEvent>> {
        Ok(self.events.lock().last().cloned())
    }

    fn rows(&self) -> Result<Vec<AuditEvent>> {
        Ok(self.events.lock().clone())
    }
}
