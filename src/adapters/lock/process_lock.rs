use std::time::Duration;

use parking_lot::Mutex;

use crate::core::errors::{Result, SignoffError};
use crate::core::traits::lock::OperationLock;

/// Operation lock scoped to the current process.
pub struct ProcessLock {
    mutex: Mutex<()>,
    timeout: Duration,
}

impl ProcessLock {
    pub fn new(timeout: Duration) -> Self {
        Self {
            mutex: Mutex::new(()),
            timeout,
        }
    }
}

impl OperationLock for ProcessLock {
    fn run_exclusive<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        let Some(_guard) = self.mutex.try_lock_for(self.timeout) else {
            return Err(SignoffError::LockTimeout {
                waited: self.timeout,
            });
        };
        f()
    }
}
