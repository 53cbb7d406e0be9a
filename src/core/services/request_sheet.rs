use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::core::errors::{Result, SignoffError};
use crate::core::models::approval_config::ApprovalConfig;
use crate::core::models::request::{Fields, Request, RowRef};
use crate::core::models::row_guard::RowGuard;
use crate::core::models::status::Status;
use crate::core::traits::row_guards::RowGuards;
use crate::core::traits::row_store::RowStore;

/// Request-shaped access to the row store: column checks, id assignment,
/// decision cells and row guards.
pub struct RequestSheet<'a, S: RowStore + RowGuards> {
    store: &'a S,
    config: &'a ApprovalConfig,
}

impl<'a, S: RowStore + RowGuards> RequestSheet<'a, S> {
    pub fn new(store: &'a S, config: &'a ApprovalConfig) -> Self {
        Self { store, config }
    }

    /// Fail with `MissingHeader` unless every required column exists.
    /// Returns the sheet headers.
    pub fn require_headers(&self) -> Result<Vec<String>> {
        let headers = self.store.headers()?;
        for required in self.config.headers.required() {
            if !headers.iter().any(|h| h == required) {
                return Err(SignoffError::MissingHeader {
                    header: required.to_string(),
                });
            }
        }
        Ok(headers)
    }

    /// Reject cells for headers that are not columns of the sheet.
    pub fn require_columns(&self, fields: &Fields) -> Result<()> {
        let headers = self.store.headers()?;
        if let Some(unknown) = fields.keys().find(|k| !headers.contains(k)) {
            return Err(SignoffError::Store {
                detail: format!(
                    "no column named '{unknown}' (columns: {})",
                    headers.join(", ")
                ),
            });
        }
        Ok(())
    }

    /// The approved-hash column, if configured and present in the sheet.
    pub fn approved_hash_column(&self, headers: &[String]) -> Option<&'a str> {
        self.config
            .headers
            .approved_hash
            .as_deref()
            .filter(|h| headers.iter().any(|x| x == h))
    }

    /// Deduplicate and sort a selection, rejecting empty selections and
    /// refs outside the data rows.
    pub fn validate_rows(&self, rows: &[RowRef]) -> Result<Vec<RowRef>> {
        if rows.is_empty() {
            return Err(SignoffError::NoRowsSelected);
        }
        let last = self.store.last_row_index()?;
        let mut selected = rows.to_vec();
        selected.sort();
        selected.dedup();
        if let Some(bad) = selected.iter().find(|r| !r.is_data() || r.number() > last) {
            return Err(SignoffError::RowOutOfRange {
                row: bad.number(),
                last,
            });
        }
        Ok(selected)
    }

    pub fn last_row_index(&self) -> Result<u32> {
        self.store.last_row_index()
    }

    /// Every data row, top to bottom.
    pub fn data_rows(&self) -> Result<Vec<RowRef>> {
        let last = self.store.last_row_index()?;
        Ok((RowRef::FIRST_DATA.number()..=last).map(RowRef).collect())
    }

    pub fn read(&self, row: RowRef) -> Result<(Fields, Request)> {
        let fields = self.store.read_row(row)?;
        let request = Request::from_fields(
            row,
            &fields,
            &self.config.headers,
            &self.config.statuses,
        );
        Ok((fields, request))
    }

    /// Return the row's id, generating and persisting one if blank.
    /// An existing id is never rewritten.
    pub fn ensure_id(&self, row: RowRef, current: &str) -> Result<String> {
        if !current.is_empty() {
            return Ok(current.to_string());
        }
        let id = Uuid::new_v4().to_string();
        self.write(row, &self.config.headers.id, &id)?;
        tracing::debug!(%row, request_id = %id, "assigned request id");
        Ok(id)
    }

    pub fn write_status(&self, row: RowRef, status: Status) -> Result<()> {
        let label = self.config.statuses.label(status);
        self.write(row, &self.config.headers.status, label)
    }

    /// Stamp approver, decision time and notes.
    pub fn record_decision(&self, row: RowRef, actor: &str, notes: &str) -> Result<()> {
        let headers = &self.config.headers;
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        self.write(row, &headers.approver, actor)?;
        self.write(row, &headers.decision_at, &now)?;
        self.write(row, &headers.decision_notes, notes)
    }

    /// Clear approver and decision time; notes become `notes`.
    pub fn clear_decision(&self, row: RowRef, notes: &str) -> Result<()> {
        let headers = &self.config.headers;
        self.write(row, &headers.approver, "")?;
        self.write(row, &headers.decision_at, "")?;
        self.write(row, &headers.decision_notes, notes)
    }

    pub fn write_approved_hash(&self, row: RowRef, column: &str, hash: &str) -> Result<()> {
        self.write(row, column, hash)
    }

    /// Place this system's guard on an approved row unless one is already
    /// there. Failures are logged and ignored.
    pub fn acquire_guard(&self, row: RowRef, request_id: &str) {
        let guard = RowGuard::for_request(request_id, self.config.guard.warning_only);
        let result = self.store.guards(row).and_then(|existing| {
            if existing.iter().any(|g| g.name == guard.name) {
                tracing::debug!(%row, guard = %guard.name, "guard already present");
                return Ok(());
            }
            self.store.add_guard(row, guard.clone())
        });
        if let Err(e) = result {
            tracing::warn!(%row, guard = %guard.name, error = %e, "could not place row guard; continuing");
        }
    }

    /// Remove every guard this system created on the row. Failures are
    /// logged and ignored.
    pub fn release_guards(&self, row: RowRef) {
        let result = self.store.guards(row).and_then(|existing| {
            existing
                .iter()
                .filter(|g| g.is_ours())
                .try_for_each(|g| self.store.remove_guard(row, &g.name))
        });
        if let Err(e) = result {
            tracing::warn!(%row, error = %e, "could not release row guard; continuing");
        }
    }

    fn write(&self, row: RowRef, header: &str, text: &str) -> Result<()> {
        self.store
            .write_cell(row, header, Value::String(text.to_string()))
    }
}
