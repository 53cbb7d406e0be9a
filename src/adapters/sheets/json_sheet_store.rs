use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::NamedTempFile;

use crate::adapters::sheets::sheet_document::SheetDocument;
use crate::core::errors::{Result, SignoffError};
use crate::core::models::request::{Fields, RowRef};
use crate::core::models::row_guard::RowGuard;
use crate::core::traits::row_guards::RowGuards;
use crate::core::traits::row_store::RowStore;

/// Request sheet stored as a JSON workbook on disk.
///
/// Every call reloads the file, so edits made by hand between commands
/// are always seen. Each write replaces the file atomically through a
/// temp file in the same directory.
#[derive(Debug)]
pub struct JsonSheetStore {
    path: PathBuf,
}

impl JsonSheetStore {
    /// Write a new, empty workbook with the given header row.
    pub fn create(path: &Path, headers: Vec<String>) -> Result<Self> {
        let store = Self {
            path: path.to_path_buf(),
        };
        store.save(&SheetDocument::new(headers))?;
        Ok(store)
    }

    /// Open an existing workbook.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SignoffError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    fn load(&self) -> Result<SheetDocument> {
        let content = fs::read_to_string(&self.path)?;
        serde_json::from_str(&content).map_err(|e| SignoffError::Store {
            detail: format!("{} is not a valid request sheet: {e}", self.path.display()),
        })
    }

    fn save(&self, doc: &SheetDocument) -> Result<()> {
        let json = serde_json::to_string_pretty(doc).map_err(|e| SignoffError::Store {
            detail: format!("Failed to serialize request sheet: {e}"),
        })?;

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    fn update<T>(&self, f: impl FnOnce(&mut SheetDocument) -> Result<T>) -> Result<T> {
        let mut doc = self.load()?;
        let out = f(&mut doc)?;
        self.save(&doc)?;
        Ok(out)
    }
}

impl RowStore for JsonSheetStore {
    fn headers(&self) -> Result<Vec<String>> {
        Ok(self.load()?.headers)
    }

    fn read_row(&self, row: RowRef) -> Result<Fields> {
        self.load()?.read_row(row)
    }

    fn write_cell(&self, row: RowRef, header: &str, value: Value) -> Result<()> {
        self.update(|doc| doc.write_cell(row, header, value))
    }

    fn append_row(&self, values: &Fields) -> Result<RowRef> {
        self.update(|doc| doc.append_row(values))
    }

    fn last_row_index(&self) -> Result<u32> {
        Ok(self.load()?.last_row_index())
    }
}

impl RowGuards for JsonSheetStore {
    fn guards(&self, row: RowRef) -> Result<Vec<RowGuard>> {
        Ok(self.load()?.guards(row))
    }

    fn add_guard(&self, row: RowRef, guard: RowGuard) -> Result<()> {
        self.update(|doc| doc.add_guard(row, guard))
    }

    fn remove_guard(&self, row: RowRef, name: &str) -> Result<()> {
        self.update(|doc| {
            doc.remove_guard(row, name);
            Ok(())
        })
    }
}
