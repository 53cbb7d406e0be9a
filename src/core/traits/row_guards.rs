use crate::core::errors::Result;
use crate::core::models::request::RowRef;
use crate::core::models::row_guard::RowGuard;

/// Port for advisory row protections offered by the row store.
///
/// Calls may fail with `PermissionDenied`; the core treats every failure
/// here as non-fatal.
pub trait RowGuards: Send + Sync {
    /// Guards currently on the row.
    fn guards(&self, row: RowRef) -> Result<Vec<RowGuard>>;

    fn add_guard(&self, row: RowRef, guard: RowGuard) -> Result<()>;

    /// Remove the named guard. Removing a guard that is not there is not
    /// an error.
    fn remove_guard(&self, row: RowRef, name: &str) -> Result<()>;
}
