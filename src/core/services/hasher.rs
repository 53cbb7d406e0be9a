use std::collections::BTreeMap;

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::core::models::approval_config::ApprovalConfig;
use crate::core::models::request::Fields;

/// Compute the SHA256 hex digest of a canonical string.
pub fn digest(canonical: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Derives an order-independent digest over the meaningful columns of a
/// request.
///
/// The meaningful set is `tracked - exempt` when tracked columns are
/// configured, otherwise `all - exempt`. The approved-hash column is never
/// part of it, since it is written after hashing.
pub struct MeaningfulHasher<'a> {
    config: &'a ApprovalConfig,
}

impl<'a> MeaningfulHasher<'a> {
    pub fn new(config: &'a ApprovalConfig) -> Self {
        Self { config }
    }

    /// Whether an edit to `header` can invalidate an approval.
    pub fn is_meaningful(&self, header: &str) -> bool {
        let policy = &self.config.reapproval;
        if self.config.headers.approved_hash.as_deref() == Some(header) {
            return false;
        }
        if policy.exempt_headers.contains(header) {
            return false;
        }
        policy.tracked_headers.is_empty() || policy.tracked_headers.contains(header)
    }

    /// The meaningful subset of `headers`, sorted and deduplicated.
    pub fn meaningful_subset<'h, I>(&self, headers: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'h str>,
    {
        let mut subset: Vec<String> = headers
            .into_iter()
            .filter(|h| self.is_meaningful(h))
            .map(str::to_string)
            .collect();
        subset.sort();
        subset.dedup();
        subset
    }

    /// Sorted-key JSON of the meaningful fields.
    pub fn compute_snapshot(&self, fields: &Fields) -> String {
        let selected: BTreeMap<&str, &Value> = fields
            .iter()
            .filter(|(k, _)| self.is_meaningful(k))
            .map(|(k, v)| (k.as_str(), v))
            .collect();
        serde_json::to_string(&selected).unwrap_or_else(|_| "{}".to_string())
    }

    /// Digest of the canonical snapshot.
    pub fn hash(&self, fields: &Fields) -> String {
        digest(&self.compute_snapshot(fields))
    }
}
