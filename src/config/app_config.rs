use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use crate::core::errors::{Result, SignoffError};
use crate::core::models::approval_config::{
    ApprovalConfig, GuardPolicy, HeaderNames, ReapprovalPolicy, StatusLabels,
};
use crate::core::models::status::Status;

/// Top-level Signoff configuration read from `.signoff/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub signoff: SignoffSection,
    #[serde(default)]
    pub headers: HeadersSection,
    #[serde(default)]
    pub statuses: StatusesSection,
    #[serde(default)]
    pub reapproval: ReapprovalSection,
    #[serde(default)]
    pub lock: LockSection,
    #[serde(default)]
    pub audit: AuditSection,
}

impl AppConfig {
    /// Load the configuration from `.signoff/config.toml`.
    ///
    /// After parsing, validates file names (no path traversal from a
    /// tampered config), column names and status labels.
    pub fn load(signoff_dir: &Path) -> Result<Self> {
        let config_path = signoff_dir.join("config.toml");
        if !config_path.exists() {
            return Err(SignoffError::InvalidConfig {
                detail: "config.toml not found. Run 'signoff init' first.".into(),
            });
        }
        let content = std::fs::read_to_string(&config_path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| SignoffError::InvalidConfig {
            detail: format!("Failed to parse config.toml: {e}"),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults written by `signoff init`.
    pub fn new_project() -> Self {
        Self {
            signoff: SignoffSection::default(),
            headers: HeadersSection::default(),
            statuses: StatusesSection::default(),
            reapproval: ReapprovalSection::default(),
            lock: LockSection::default(),
            audit: AuditSection::default(),
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| SignoffError::InvalidConfig {
            detail: format!("Failed to serialize config: {e}"),
        })
    }

    fn validate(&self) -> Result<()> {
        if self.signoff.format_version > CURRENT_FORMAT_VERSION {
            return Err(SignoffError::InvalidConfig {
                detail: format!(
                    "project format version {} is newer than supported version {CURRENT_FORMAT_VERSION}. \
                     Upgrade signoff.",
                    self.signoff.format_version
                ),
            });
        }

        crate::cli::context::validate_simple_filename(&self.signoff.sheet, "request sheet")?;
        crate::cli::context::validate_simple_filename(&self.audit.log_file, "audit log file")?;

        let columns = self.headers.columns();
        let mut seen = BTreeSet::new();
        for (key, name) in &columns {
            if name.trim().is_empty() {
                return Err(SignoffError::InvalidConfig {
                    detail: format!("[headers] {key} must not be empty"),
                });
            }
            if !seen.insert(name.as_str()) {
                return Err(SignoffError::InvalidConfig {
                    detail: format!("[headers] column '{name}' is used twice"),
                });
            }
        }

        let labels = [
            &self.statuses.pending,
            &self.statuses.approved,
            &self.statuses.rejected,
        ];
        let distinct: BTreeSet<String> = labels.iter().map(|l| l.trim().to_lowercase()).collect();
        if distinct.len() != labels.len() || distinct.contains("") {
            return Err(SignoffError::InvalidConfig {
                detail: "[statuses] labels must be non-empty and distinct".into(),
            });
        }

        self.reapproval.parsed_from_statuses()?;
        Ok(())
    }

    /// The immutable value handed to the core.
    ///
    /// Without an explicit `exempt_headers` list the required columns, as
    /// named in `[headers]`, are exempt.
    pub fn to_approval_config(&self) -> Result<ApprovalConfig> {
        let h = &self.headers;
        let headers = HeaderNames {
            id: h.id.clone(),
            status: h.status.clone(),
            approver: h.approver.clone(),
            decision_at: h.decision_at.clone(),
            decision_notes: h.decision_notes.clone(),
            approved_hash: h.approved_hash.clone().filter(|s| !s.trim().is_empty()),
        };
        let exempt_headers = match &self.reapproval.exempt_headers {
            Some(list) => list.iter().cloned().collect(),
            None => headers.required().iter().map(|c| c.to_string()).collect(),
        };
        Ok(ApprovalConfig {
            headers,
            statuses: StatusLabels {
                pending: self.statuses.pending.clone(),
                approved: self.statuses.approved.clone(),
                rejected: self.statuses.rejected.clone(),
            },
            reapproval: ReapprovalPolicy {
                enabled: self.reapproval.enabled,
                tracked_headers: self.reapproval.tracked_headers.iter().cloned().collect(),
                exempt_headers,
                from_statuses: self.reapproval.parsed_from_statuses()?,
            },
            guard: GuardPolicy {
                lock_on_approve: self.lock.on_approve,
                warning_only: self.lock.warning_only,
            },
            hash_chain: self.audit.hash_chain,
            lock_timeout: Duration::from_secs(self.lock.timeout_secs),
        })
    }
}

/// Current format version supported by this build of Signoff.
pub const CURRENT_FORMAT_VERSION: u32 = 1;

/// The `[signoff]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignoffSection {
    pub version: String,
    /// Format version for backward compatibility. Defaults to 1 if missing.
    #[serde(default = "default_format_version")]
    pub format_version: u32,
    /// Request sheet file name inside `.signoff/`.
    #[serde(default = "default_sheet")]
    pub sheet: String,
}

impl Default for SignoffSection {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            format_version: default_format_version(),
            sheet: default_sheet(),
        }
    }
}

fn default_format_version() -> u32 {
    1
}

fn default_sheet() -> String {
    "requests.json".into()
}

/// The `[headers]` section. An empty `approved_hash` disables drift
/// detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadersSection {
    pub id: String,
    pub status: String,
    pub approver: String,
    pub decision_at: String,
    pub decision_notes: String,
    pub approved_hash: Option<String>,
}

impl HeadersSection {
    fn columns(&self) -> Vec<(&'static str, &String)> {
        let mut cols = vec![
            ("id", &self.id),
            ("status", &self.status),
            ("approver", &self.approver),
            ("decision_at", &self.decision_at),
            ("decision_notes", &self.decision_notes),
        ];
        if let Some(h) = &self.approved_hash
            && !h.trim().is_empty()
        {
            cols.push(("approved_hash", h));
        }
        cols
    }

    /// Every configured column in sheet order, for a fresh sheet.
    pub fn sheet_columns(&self) -> Vec<String> {
        self.columns().into_iter().map(|(_, h)| h.clone()).collect()
    }
}

impl Default for HeadersSection {
    fn default() -> Self {
        let h = HeaderNames::default();
        Self {
            id: h.id,
            status: h.status,
            approver: h.approver,
            decision_at: h.decision_at,
            decision_notes: h.decision_notes,
            approved_hash: h.approved_hash,
        }
    }
}

/// The `[statuses]` section: text written to the status column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusesSection {
    pub pending: String,
    pub approved: String,
    pub rejected: String,
}

impl Default for StatusesSection {
    fn default() -> Self {
        let l = StatusLabels::default();
        Self {
            pending: l.pending,
            approved: l.approved,
            rejected: l.rejected,
        }
    }
}

/// The `[reapproval]` section. `exempt_headers` falls back to the
/// required columns when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReapprovalSection {
    pub enabled: bool,
    pub tracked_headers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exempt_headers: Option<Vec<String>>,
    pub from_statuses: Vec<String>,
}

impl ReapprovalSection {
    fn parsed_from_statuses(&self) -> Result<BTreeSet<Status>> {
        self.from_statuses
            .iter()
            .map(|s| {
                s.parse::<Status>().map_err(|_| SignoffError::InvalidConfig {
                    detail: format!(
                        "[reapproval] from_statuses: unknown status '{s}' (expected PENDING, APPROVED or REJECTED)"
                    ),
                })
            })
            .collect()
    }
}

impl Default for ReapprovalSection {
    fn default() -> Self {
        let p = ApprovalConfig::default().reapproval;
        Self {
            enabled: p.enabled,
            tracked_headers: p.tracked_headers.into_iter().collect(),
            exempt_headers: None,
            from_statuses: p.from_statuses.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// The `[lock]` section: row guards and the operation lock wait.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockSection {
    pub on_approve: bool,
    pub warning_only: bool,
    pub timeout_secs: u64,
}

impl Default for LockSection {
    fn default() -> Self {
        Self {
            on_approve: true,
            warning_only: true,
            timeout_secs: 30,
        }
    }
}

/// The `[audit]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditSection {
    pub hash_chain: bool,
    pub log_file: String,
}

impl Default for AuditSection {
    fn default() -> Self {
        Self {
            hash_chain: true,
            log_file: "audit.log".into(),
        }
    }
}
