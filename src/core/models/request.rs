use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::models::approval_config::{HeaderNames, StatusLabels};
use crate::core::models::status::Status;

/// A row's cells keyed by header name.
///
/// Unknown business columns are carried verbatim; the map is ordered so
/// any serialization of it is independent of column order in the sheet.
pub type Fields = BTreeMap<String, Value>;

/// Sheet row number of a request. Row 1 holds the headers, so data rows
/// start at 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowRef(pub u32);

impl RowRef {
    pub const HEADER: RowRef = RowRef(1);
    pub const FIRST_DATA: RowRef = RowRef(2);

    pub fn number(self) -> u32 {
        self.0
    }

    pub fn is_data(self) -> bool {
        self >= Self::FIRST_DATA
    }
}

impl fmt::Display for RowRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}", self.0)
    }
}

/// Contiguous block of rows touched by one edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    pub first: RowRef,
    pub last: RowRef,
}

impl RowRange {
    pub fn single(row: RowRef) -> Self {
        Self {
            first: row,
            last: row,
        }
    }

    /// Data rows of the range that exist in a sheet whose last row is
    /// `last_index`.
    pub fn data_rows(&self, last_index: u32) -> Vec<RowRef> {
        let start = self.first.max(RowRef::FIRST_DATA).number();
        let end = self.last.number().min(last_index);
        (start..=end).map(RowRef).collect()
    }
}

/// Render a cell as trimmed text. Blank cells and nulls become "".
pub fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string(),
    }
}

/// Typed view of one request row.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub row: RowRef,
    pub id: String,
    pub status: Option<Status>,
    pub approver: String,
    pub decision_at: String,
    pub decision_notes: String,
    pub approved_hash: Option<String>,
    /// Business payload: every column that is not a system column.
    pub extra: Fields,
}

impl Request {
    pub fn from_fields(
        row: RowRef,
        fields: &Fields,
        headers: &HeaderNames,
        labels: &StatusLabels,
    ) -> Self {
        let text = |h: &str| cell_text(fields.get(h));

        let approved_hash = headers
            .approved_hash
            .as_deref()
            .map(text)
            .filter(|h| !h.is_empty());

        let mut extra = fields.clone();
        for h in headers.required() {
            extra.remove(h);
        }
        if let Some(h) = &headers.approved_hash {
            extra.remove(h);
        }

        Self {
            row,
            id: text(&headers.id),
            status: labels.parse(&text(&headers.status)),
            approver: text(&headers.approver),
            decision_at: text(&headers.decision_at),
            decision_notes: text(&headers.decision_notes),
            approved_hash,
            extra,
        }
    }
}
