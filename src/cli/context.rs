use std::path::{Component, Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

use crate::adapters::ledger::jsonl_ledger_store::JsonlLedgerStore;
use crate::adapters::lock::file_lock::FileLock;
use crate::adapters::sheets::json_sheet_store::JsonSheetStore;
use crate::config::app_config::AppConfig;
use crate::core::errors::{Result, SignoffError};
use crate::core::services::approvals::Approvals;

static SIGNOFF_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Lock file guarding every mutating command.
pub const LOCK_FILE: &str = "signoff.lock";

/// Initialize the global signoff directory path.
/// If `custom` is provided, uses that path; otherwise defaults to `.signoff`.
pub fn init(custom: Option<&str>) {
    let dir = custom
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(".signoff"));
    let _ = SIGNOFF_DIR.set(dir);
}

/// Get the current signoff directory path.
pub fn signoff_dir() -> &'static Path {
    SIGNOFF_DIR
        .get()
        .map(|p| p.as_path())
        .unwrap_or(Path::new(".signoff"))
}

/// Approvals wired to the on-disk sheet, ledger and lock.
pub type ProjectApprovals = Approvals<JsonSheetStore, JsonlLedgerStore, FileLock>;

/// Load the project configuration and open its stores.
pub fn open_project() -> Result<(AppConfig, ProjectApprovals)> {
    let dir = signoff_dir();
    if !dir.exists() {
        return Err(SignoffError::InvalidConfig {
            detail: "Signoff not initialized. Run 'signoff init' first.".into(),
        });
    }

    let app = AppConfig::load(dir)?;
    let config = app.to_approval_config()?;
    let store = JsonSheetStore::open(&dir.join(&app.signoff.sheet))?;
    let ledger = JsonlLedgerStore::from_config(dir, &app.audit);
    let lock = FileLock::new(&dir.join(LOCK_FILE), config.lock_timeout);
    tracing::debug!(dir = %dir.display(), sheet = %app.signoff.sheet, "project opened");

    Ok((app, Approvals::new(store, ledger, lock, config)))
}

/// Who is acting: `--actor`, then git `user.name`, then `$USER`.
pub fn resolve_actor(explicit: Option<&str>) -> String {
    if let Some(a) = explicit.map(str::trim).filter(|a| !a.is_empty()) {
        return a.to_string();
    }
    git_user_name()
        .or_else(|| std::env::var("USER").ok().filter(|u| !u.trim().is_empty()))
        .unwrap_or_else(|| "unknown".to_string())
}

fn git_user_name() -> Option<String> {
    let output = Command::new("git")
        .args(["config", "user.name"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!name.is_empty()).then_some(name)
}

/// Reject anything that is not a bare file name.
pub fn validate_simple_filename(name: &str, what: &str) -> Result<()> {
    let path = Path::new(name);
    let mut components = path.components();
    let simple = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if name.trim().is_empty() || !simple {
        return Err(SignoffError::InvalidConfig {
            detail: format!("Invalid {what} '{name}': must be a plain file name without directories"),
        });
    }
    Ok(())
}
