use parking_lot::Mutex;
use serde_json::Value;

use crate::adapters::sheets::sheet_document::SheetDocument;
use crate::core::errors::{Result, SignoffError};
use crate::core::models::request::{Fields, RowRef};
use crate::core::models::row_guard::RowGuard;
use crate::core::traits::row_guards::RowGuards;
use crate::core::traits::row_store::RowStore;

/// Request sheet held in memory.
///
/// Failure switches let tests simulate a host that refuses guards or a
/// store that breaks partway through a batch.
pub struct MemorySheetStore {
    doc: Mutex<SheetDocument>,
    faults: Mutex<Faults>,
}

#[derive(Default)]
struct Faults {
    deny_guards: bool,
    fail_writes_on: Option<RowRef>,
}

impl MemorySheetStore {
    pub fn with_headers(headers: Vec<String>) -> Self {
        Self {
            doc: Mutex::new(SheetDocument::new(headers)),
            faults: Mutex::new(Faults::default()),
        }
    }

    /// Make guard calls fail with `PermissionDenied`.
    pub fn deny_guards(&self, deny: bool) {
        self.faults.lock().deny_guards = deny;
    }

    /// Make cell writes to `row` fail. Reads keep working.
    pub fn fail_writes_on(&self, row: Option<RowRef>) {
        self.faults.lock().fail_writes_on = row;
    }

    fn check_guards_allowed(&self) -> Result<()> {
        if self.faults.lock().deny_guards {
            return Err(SignoffError::PermissionDenied {
                detail: "row protection is not allowed for this user".into(),
            });
        }
        Ok(())
    }
}

impl RowStore for MemorySheetStore {
    fn headers(&self) -> Result<Vec<String>> {
        Ok(self.doc.lock().headers.clone())
    }

    fn read_row(&self, row: RowRef) -> Result<Fields> {
        self.doc.lock().read_row(row)
    }

    fn write_cell(&self, row: RowRef, header: &str, value: Value) -> Result<()> {
        if self.faults.lock().fail_writes_on == Some(row) {
            return Err(SignoffError::Store {
                detail: format!("write to {row} failed"),
            });
        }
        self.doc.lock().write_cell(row, header, value)
    }

    fn append_row(&self, values: &Fields) -> Result<RowRef> {
        self.doc.lock().append_row(values)
    }

    fn last_row_index(&self) -> Result<u32> {
        Ok(self.doc.lock().last_row_index())
    }
}

impl RowGuards for MemorySheetStore {
    fn guards(&self, row: RowRef) -> Result<Vec<RowGuard>> {
        self.check_guards_allowed()?;
        Ok(self.doc.lock().guards(row))
    }

    fn add_guard(&self, row: RowRef, guard: RowGuard) -> Result<()> {
        self.check_guards_allowed()?;
        self.doc.lock().add_guard(row, guard)
    }

    fn remove_guard(&self, row: RowRef, name: &str) -> Result<()> {
        self.check_guards_allowed()?;
        self.doc.lock().remove_guard(row, name);
        Ok(())
    }
}
