use serde_json::Value;

use crate::core::errors::Result;
use crate::core::models::request::{Fields, RowRef};

/// Port for the tabular store holding request rows.
///
/// Row 1 is the header row. Implementations live in `adapters::sheets`;
/// the core only relies on this narrow read/write contract and never
/// assumes multi-row atomicity.
pub trait RowStore: Send + Sync {
    /// Header names in column order.
    fn headers(&self) -> Result<Vec<String>>;

    /// All cells of a row keyed by header name.
    fn read_row(&self, row: RowRef) -> Result<Fields>;

    /// Overwrite a single cell.
    fn write_cell(&self, row: RowRef, header: &str, value: Value) -> Result<()>;

    /// Append a row; headers absent from `values` are left blank.
    fn append_row(&self, values: &Fields) -> Result<RowRef>;

    /// Number of the last used row (1 when only headers exist).
    fn last_row_index(&self) -> Result<u32>;
}
