use std::io::Write;
use std::path::Path;

use crate::adapters::sheets::json_sheet_store::JsonSheetStore;
use crate::cli::context::{self, LOCK_FILE};
use crate::cli::output;
use crate::config::app_config::AppConfig;
use crate::core::errors::{Result, SignoffError};

/// Execute the `signoff init` command.
///
/// Creates the project directory with a default `config.toml`, an empty
/// request sheet holding the required columns plus `columns`, and records
/// the `SETUP` event that opens the audit log.
pub fn execute(columns: &[String], actor: &str, verbose: bool) -> Result<()> {
    let dir = context::signoff_dir();

    if dir.exists() {
        return Err(SignoffError::InvalidConfig {
            detail: format!(
                "Signoff is already initialized in this project ({} exists)",
                dir.display()
            ),
        });
    }

    let app = AppConfig::new_project();
    let headers = sheet_headers(&app, columns)?;

    output::header("Signoff: initializing project");

    std::fs::create_dir_all(dir)?;
    output::success(&format!("Created {}/", dir.display()));

    std::fs::write(dir.join("config.toml"), app.to_toml()?)?;
    output::success("Generated config.toml with defaults");

    JsonSheetStore::create(&dir.join(&app.signoff.sheet), headers.clone())?;
    output::success(&format!(
        "Created {} with columns: {}",
        app.signoff.sheet,
        headers.join(", ")
    ));

    add_to_gitignore(&dir.join(LOCK_FILE))?;

    let (_, approvals) = context::open_project()?;
    let event = approvals.setup(actor)?;
    output::success(&format!(
        "Recorded {} event in {} (by {})",
        event.action, app.audit.log_file, event.actor
    ));

    output::success("Project ready.\n");
    print_next_steps(verbose);
    Ok(())
}

fn sheet_headers(app: &AppConfig, extra: &[String]) -> Result<Vec<String>> {
    let mut headers = app.headers.sheet_columns();
    for column in extra.iter().map(|c| c.trim()).filter(|c| !c.is_empty()) {
        if headers.iter().any(|h| h == column) {
            return Err(SignoffError::InvalidConfig {
                detail: format!("column '{column}' is listed twice"),
            });
        }
        headers.push(column.to_string());
    }
    Ok(headers)
}

/// Keep the lock file out of version control.
fn add_to_gitignore(lock_path: &Path) -> Result<()> {
    let gitignore = Path::new(".gitignore");
    let entry = lock_path.display().to_string();

    if gitignore.exists() {
        let content = std::fs::read_to_string(gitignore)?;
        if content.lines().any(|l| l.trim() == entry) {
            return Ok(());
        }
        let mut file = std::fs::OpenOptions::new().append(true).open(gitignore)?;
        writeln!(file, "\n# Signoff: operation lock\n{entry}")?;
    } else {
        std::fs::write(gitignore, format!("# Signoff: operation lock\n{entry}\n"))?;
    }
    output::success(&format!("Added {entry} to .gitignore"));
    Ok(())
}

fn print_next_steps(verbose: bool) {
    println!("  Next steps:");
    println!("    signoff add --set Title=\"New laptop\"");
    println!("    signoff approve --row 2 --notes \"within budget\"");
    println!("    signoff verify");
    if verbose {
        println!();
        println!("  Edit .signoff/config.toml to choose which columns require reapproval");
        println!("  ([reapproval] tracked_headers / exempt_headers).");
    }
}
