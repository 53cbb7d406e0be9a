use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::errors::{Result, SignoffError};
use crate::core::models::request::{Fields, RowRef};
use crate::core::models::row_guard::RowGuard;

/// A guard pinned to a row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardEntry {
    pub row: RowRef,
    #[serde(flatten)]
    pub guard: RowGuard,
}

/// In-memory image of a request sheet: a header row, positional data rows
/// and the guards placed on them.
///
/// Shared by the JSON file store and the in-memory store so both behave
/// the same cell for cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SheetDocument {
    pub headers: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<Value>>,
    #[serde(default)]
    pub guards: Vec<GuardEntry>,
}

impl SheetDocument {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            ..Self::default()
        }
    }

    pub fn last_row_index(&self) -> u32 {
        self.rows.len() as u32 + 1
    }

    pub fn read_row(&self, row: RowRef) -> Result<Fields> {
        let cells = &self.rows[self.row_index(row)?];
        Ok(self
            .headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), cells.get(i).cloned().unwrap_or(Value::Null)))
            .collect())
    }

    pub fn write_cell(&mut self, row: RowRef, header: &str, value: Value) -> Result<()> {
        let col = self.column(header)?;
        let idx = self.row_index(row)?;
        let width = self.headers.len();
        let cells = &mut self.rows[idx];
        if cells.len() < width {
            cells.resize(width, Value::Null);
        }
        cells[col] = value;
        Ok(())
    }

    pub fn append_row(&mut self, values: &Fields) -> Result<RowRef> {
        let mut cells = vec![Value::Null; self.headers.len()];
        for (header, value) in values {
            cells[self.column(header)?] = value.clone();
        }
        self.rows.push(cells);
        Ok(RowRef(self.last_row_index()))
    }

    pub fn guards(&self, row: RowRef) -> Vec<RowGuard> {
        self.guards
            .iter()
            .filter(|g| g.row == row)
            .map(|g| g.guard.clone())
            .collect()
    }

    pub fn add_guard(&mut self, row: RowRef, guard: RowGuard) -> Result<()> {
        self.row_index(row)?;
        self.guards.push(GuardEntry { row, guard });
        Ok(())
    }

    pub fn remove_guard(&mut self, row: RowRef, name: &str) {
        self.guards.retain(|g| !(g.row == row && g.guard.name == name));
    }

    fn column(&self, header: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == header)
            .ok_or_else(|| SignoffError::Store {
                detail: format!("no column named '{header}'"),
            })
    }

    fn row_index(&self, row: RowRef) -> Result<usize> {
        if !row.is_data() || row.number() > self.last_row_index() {
            return Err(SignoffError::Store {
                detail: format!("{row} does not exist"),
            });
        }
        Ok((row.number() - RowRef::FIRST_DATA.number()) as usize)
    }
}
