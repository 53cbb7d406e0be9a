use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use fd_lock::RwLock;

use crate::core::errors::{Result, SignoffError};
use crate::core::traits::lock::OperationLock;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Operation lock shared by every process working on the same project,
/// held as an exclusive advisory lock on a file in `.signoff/`.
pub struct FileLock {
    path: PathBuf,
    timeout: Duration,
}

impl FileLock {
    pub fn new(path: &Path, timeout: Duration) -> Self {
        Self {
            path: path.to_path_buf(),
            timeout,
        }
    }

    fn open(&self) -> Result<File> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        Ok(OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.path)?)
    }
}

impl OperationLock for FileLock {
    fn run_exclusive<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        let mut lock = RwLock::new(self.open()?);
        let deadline = Instant::now() + self.timeout;

        loop {
            match lock.try_write() {
                Ok(_guard) => {
                    tracing::debug!(path = %self.path.display(), "operation lock acquired");
                    return f();
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    if Instant::now() >= deadline {
                        tracing::warn!(path = %self.path.display(), "timed out waiting for operation lock");
                        return Err(SignoffError::LockTimeout {
                            waited: self.timeout,
                        });
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
