use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::config::app_config::AuditSection;
use crate::core::errors::{Result, SignoffError};
use crate::core::models::audit_event::AuditEvent;
use crate::core::models::log_filter::LogFilter;
use crate::core::traits::ledger_store::LedgerStore;

/// Audit ledger kept as JSON lines, one `AuditEvent` per line.
///
/// Lines are only ever appended. Callers serialize appends through the
/// operation lock, so reading the tail and writing the next line never
/// race.
pub struct JsonlLedgerStore {
    log_path: PathBuf,
}

impl JsonlLedgerStore {
    /// Ledger at `{signoff_dir}/{log_file}`.
    pub fn new(signoff_dir: &Path, log_file: &str) -> Self {
        Self {
            log_path: signoff_dir.join(log_file),
        }
    }

    pub fn from_config(signoff_dir: &Path, audit: &AuditSection) -> Self {
        Self::new(signoff_dir, &audit.log_file)
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }

    /// Events matching `filter`, in append order.
    pub fn query(&self, filter: &LogFilter) -> Result<Vec<AuditEvent>> {
        Ok(filter.apply(self.rows()?))
    }
}

impl LedgerStore for JsonlLedgerStore {
    fn append_row(&self, event: &AuditEvent) -> Result<()> {
        let line = serde_json::to_string(event).map_err(|e| SignoffError::Audit {
            detail: format!("Failed to serialize audit event: {e}"),
        })?;

        if let Some(parent) = self.log_path.parent()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| SignoffError::Audit {
                detail: format!("Cannot open audit log at {}: {e}", self.log_path.display()),
            })?;

        writeln!(file, "{line}")
            .and_then(|_| file.sync_data())
            .map_err(|e| SignoffError::Audit {
                detail: format!("Failed to write audit event: {e}"),
            })?;

        Ok(())
    }

    fn last_row(&self) -> Result<Option<AuditEvent>> {
        Ok(self.rows()?.pop())
    }

    fn rows(&self) -> Result<Vec<AuditEvent>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let file = fs::File::open(&self.log_path).map_err(|e| SignoffError::Audit {
            detail: format!("Cannot read audit log: {e}"),
        })?;

        let mut events = Vec::new();
        for (line_num, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| SignoffError::Audit {
                detail: format!("Error reading audit log line {}: {e}", line_num + 1),
            })?;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let event = serde_json::from_str(trimmed).map_err(|e| SignoffError::Audit {
                detail: format!("Malformed audit event at line {}: {e}", line_num + 1),
            })?;
            events.push(event);
        }

        Ok(events)
    }
}
