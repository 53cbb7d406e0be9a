use crate::core::errors::Result;
use crate::core::models::audit_event::AuditEvent;

/// Port for the append-only audit ledger storage.
pub trait LedgerStore: Send + Sync {
    /// Persist one new event after all existing ones.
    fn append_row(&self, event: &AuditEvent) -> Result<()>;

    /// The most recently appended event, if any.
    fn last_row(&self) -> Result<Option<AuditEvent>>;

    /// Every event in append order.
    fn rows(&self) -> Result<Vec<AuditEvent>>;
}
