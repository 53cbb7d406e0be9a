use std::path::PathBuf;
use std::time::Duration;

/// All domain errors for Signoff.
///
/// Each variant says what went wrong and what was left unchanged, so the
/// caller can report one explanatory message instead of a silent partial
/// failure.
#[derive(Debug, thiserror::Error)]
pub enum SignoffError {
    #[error(
        "Missing required column '{header}' in the request sheet\n\n  \
         Nothing was changed.\n  \
         Add the column to the header row, or point [headers] in \
         .signoff/config.toml at the existing column name."
    )]
    MissingHeader { header: String },

    #[error("Invalid configuration: {detail}")]
    InvalidConfig { detail: String },

    #[error(
        "No rows selected\n\n  \
         Nothing was changed. Pass at least one data row (e.g. --row 2)."
    )]
    NoRowsSelected,

    #[error(
        "Row {row} is not a request row (data rows are 2..={last})\n\n  \
         Nothing was changed."
    )]
    RowOutOfRange { row: u32, last: u32 },

    #[error("Unknown status value '{value}'")]
    InvalidStatus { value: String },

    #[error(
        "Another operation is holding the approvals lock (waited {waited:?})\n\n  \
         This call made no changes. Try again in a moment."
    )]
    LockTimeout { waited: Duration },

    #[error("Permission denied: {detail}")]
    PermissionDenied { detail: String },

    #[error("Row store error: {detail}")]
    Store { detail: String },

    #[error(
        "Row {row} was updated but its audit event could NOT be recorded: {detail}\n\n  \
         The row and the audit log are now inconsistent.\n  \
         Review row {row} and re-run the decision once the audit log is reachable."
    )]
    AuditAppendFailed { row: u32, detail: String },

    #[error(
        "Batch stopped at row {failed_row}: {source}\n\n  \
         Already updated and audited: {completed}\n  \
         NOT changed: {untouched}"
    )]
    BatchInterrupted {
        failed_row: u32,
        completed: RowList,
        untouched: RowList,
        #[source]
        source: Box<SignoffError>,
    },

    #[error("Audit log error: {detail}")]
    Audit { detail: String },

    #[error(
        "Audit chain is broken at event {first} ({count} event(s) failed verification)\n\n  \
         Events from position {first} onward cannot be trusted.\n  \
         Run 'signoff verify' for the full list."
    )]
    ChainBroken { first: usize, count: usize },

    #[error("File not found: {path}\n\n  Run 'signoff init' to create the project files.")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Row numbers rendered for batch error messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowList(pub Vec<u32>);

impl std::fmt::Display for RowList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            return write!(f, "none");
        }
        let joined = self
            .0
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "rows {joined}")
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SignoffError>;
