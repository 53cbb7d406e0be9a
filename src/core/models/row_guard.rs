use serde::{Deserialize, Serialize};

/// Prefix on every guard this system creates. Guards without it belong to
/// someone else and are never touched.
pub const GUARD_PREFIX: &str = "signoff:approved:";

/// An advisory protection on one request row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowGuard {
    pub name: String,
    /// The guard warns on edit instead of blocking it.
    pub warning_only: bool,
}

impl RowGuard {
    /// The guard placed on an approved request.
    pub fn for_request(request_id: &str, warning_only: bool) -> Self {
        Self {
            name: format!("{GUARD_PREFIX}{request_id}"),
            warning_only,
        }
    }

    pub fn is_ours(&self) -> bool {
        self.name.starts_with(GUARD_PREFIX)
    }
}
