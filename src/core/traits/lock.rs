use crate::core::errors::Result;

/// Port for the process-wide advisory lock serializing every mutating
/// operation.
///
/// Implementations wait a bounded time and fail with `LockTimeout`
/// without running `f` when the lock cannot be taken.
pub trait OperationLock: Send + Sync {
    fn run_exclusive<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>;
}
