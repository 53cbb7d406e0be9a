use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use assert_fs::TempDir;
use predicates::prelude::*;
use serde_json::Value;

/// Run signoff with a fixed actor.
fn signoff(dir: &TempDir, actor: &str) -> Command {
    let mut cmd = cargo_bin_cmd!("signoff");
    cmd.current_dir(dir.path()).args(["--actor", actor]);
    cmd
}

fn init_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    signoff(&dir, "ops")
        .args(["init", "--columns", "Title,Amount"])
        .assert()
        .success();
    dir
}

fn sheet(dir: &TempDir) -> Value {
    let text = std::fs::read_to_string(dir.path().join(".signoff/requests.json")).unwrap();
    serde_json::from_str(&text).unwrap()
}

fn cell(dir: &TempDir, row: usize, header: &str) -> String {
    let doc = sheet(dir);
    let col = doc["headers"]
        .as_array()
        .unwrap()
        .iter()
        .position(|h| h == header)
        .unwrap();
    match &doc["rows"][row - 2][col] {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn audit_actions(dir: &TempDir) -> Vec<String> {
    std::fs::read_to_string(dir.path().join(".signoff/audit.log"))
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str::<Value>(l).unwrap()["action"].as_str().unwrap().to_string())
        .collect()
}

// ─── Init ────────────────────────────────────────────────────────

#[test]
fn init_creates_project_and_setup_event() {
    let dir = init_project();

    assert!(dir.path().join(".signoff/config.toml").exists());
    assert_eq!(
        sheet(&dir)["headers"],
        serde_json::json!([
            "RequestId",
            "Status",
            "Approver",
            "DecidedAt",
            "DecisionNotes",
            "ApprovedHash",
            "Title",
            "Amount"
        ])
    );
    assert_eq!(audit_actions(&dir), vec!["SETUP"]);
}

#[test]
fn init_twice_fails() {
    let dir = init_project();
    signoff(&dir, "ops")
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already initialized"));
}

#[test]
fn commands_require_init() {
    let dir = TempDir::new().unwrap();
    signoff(&dir, "ops")
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("signoff init"));
}

// ─── Decisions ───────────────────────────────────────────────────

#[test]
fn approve_assigns_id_and_hash() {
    let dir = init_project();
    signoff(&dir, "ops")
        .args(["add", "--set", "Title=Laptop", "--set", "Amount=1200"])
        .assert()
        .success()
        .stdout(predicate::str::contains("row 2"));
    assert_eq!(cell(&dir, 2, "Status"), "PENDING");

    signoff(&dir, "alice")
        .args(["approve", "--row", "2", "--notes", "ok"])
        .assert()
        .success()
        .stdout(predicate::str::contains("APPROVED"));

    assert!(!cell(&dir, 2, "RequestId").is_empty());
    assert_eq!(cell(&dir, 2, "Status"), "APPROVED");
    assert_eq!(cell(&dir, 2, "Approver"), "alice");
    assert_eq!(cell(&dir, 2, "DecisionNotes"), "ok");
    assert_eq!(cell(&dir, 2, "ApprovedHash").len(), 64);
    assert_eq!(audit_actions(&dir), vec!["SETUP", "APPROVED"]);
}

#[test]
fn reject_and_reset() {
    let dir = init_project();
    signoff(&dir, "ops").args(["add", "--set", "Title=Chair"]).assert().success();

    signoff(&dir, "bob")
        .args(["reject", "--row", "2", "--notes", "over budget"])
        .assert()
        .success();
    assert_eq!(cell(&dir, 2, "Status"), "REJECTED");

    signoff(&dir, "bob").args(["reset", "--row", "2"]).assert().success();
    assert_eq!(cell(&dir, 2, "Status"), "PENDING");
    assert_eq!(cell(&dir, 2, "Approver"), "");
    assert_eq!(audit_actions(&dir), vec!["SETUP", "REJECTED", "PENDING"]);
}

#[test]
fn out_of_range_row_changes_nothing() {
    let dir = init_project();
    signoff(&dir, "ops").args(["add", "--set", "Title=Desk"]).assert().success();

    signoff(&dir, "alice")
        .args(["approve", "--row", "2", "--row", "9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Row 9"));

    assert_eq!(cell(&dir, 2, "Status"), "PENDING");
    assert_eq!(audit_actions(&dir), vec!["SETUP"]);
}

#[test]
fn add_rejects_unknown_column() {
    let dir = init_project();
    signoff(&dir, "ops")
        .args(["add", "--set", "Colour=red"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Colour"));
}

// ─── Reapproval on edit ──────────────────────────────────────────

#[test]
fn meaningful_edit_requires_reapproval() {
    let dir = init_project();
    signoff(&dir, "ops").args(["add", "--set", "Title=Laptop"]).assert().success();
    signoff(&dir, "alice").args(["approve", "--row", "2"]).assert().success();

    signoff(&dir, "bob")
        .args(["edit", "--row", "2", "--set", "Title=Gaming rig"])
        .assert()
        .success()
        .stdout(predicate::str::contains("needs reapproval"));

    assert_eq!(cell(&dir, 2, "Status"), "PENDING");
    assert_eq!(cell(&dir, 2, "Approver"), "");
    assert_eq!(cell(&dir, 2, "DecidedAt"), "");
    assert!(cell(&dir, 2, "DecisionNotes").contains("was APPROVED"));

    let log = std::fs::read_to_string(dir.path().join(".signoff/audit.log")).unwrap();
    let last: Value = serde_json::from_str(log.lines().last().unwrap()).unwrap();
    assert_eq!(last["action"], "REAPPROVAL_REQUIRED");
    assert_eq!(last["actor"], "bob");
    assert!(last["snapshotJson"].as_str().unwrap().contains("\"priorStatus\":\"APPROVED\""));
}

#[test]
fn exempt_edit_on_pending_row_is_ignored() {
    let dir = init_project();
    signoff(&dir, "ops").args(["add", "--set", "Title=Laptop"]).assert().success();

    signoff(&dir, "bob")
        .args(["edit", "--row", "2", "--set", "Approver=mallory"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no meaningful column"));

    assert_eq!(cell(&dir, 2, "Status"), "PENDING");
    assert_eq!(audit_actions(&dir), vec!["SETUP"]);
}

#[test]
fn edit_header_row_is_rejected() {
    let dir = init_project();
    signoff(&dir, "bob")
        .args(["edit", "--row", "1", "--set", "Title=x"])
        .assert()
        .failure();
}

// ─── Drift scan ──────────────────────────────────────────────────

#[test]
fn scan_initializes_hash_then_detects_drift() {
    let dir = init_project();
    signoff(&dir, "ops")
        .args(["add", "--set", "Title=Monitor", "--set", "Status=APPROVED"])
        .assert()
        .success();
    assert_eq!(cell(&dir, 2, "ApprovedHash"), "");

    signoff(&dir, "ops")
        .arg("scan")
        .assert()
        .success()
        .stdout(predicate::str::contains("Recorded approval hash for 1"));
    assert_eq!(cell(&dir, 2, "Status"), "APPROVED");
    assert_eq!(cell(&dir, 2, "ApprovedHash").len(), 64);
    assert_eq!(audit_actions(&dir), vec!["SETUP", "APPROVAL_HASH_SET"]);

    // Out-of-band edit: rewrite the sheet file directly.
    let mut doc = sheet(&dir);
    doc["rows"][0][6] = Value::String("Projector".into());
    std::fs::write(
        dir.path().join(".signoff/requests.json"),
        serde_json::to_string_pretty(&doc).unwrap(),
    )
    .unwrap();

    signoff(&dir, "ops")
        .arg("scan")
        .assert()
        .success()
        .stdout(predicate::str::contains("reopened"));
    assert_eq!(cell(&dir, 2, "Status"), "PENDING");

    let log = std::fs::read_to_string(dir.path().join(".signoff/audit.log")).unwrap();
    let last: Value = serde_json::from_str(log.lines().last().unwrap()).unwrap();
    assert_eq!(last["action"], "REAPPROVAL_REQUIRED");
    assert!(last["snapshotJson"].as_str().unwrap().contains("\"reason\":\"hash_mismatch\""));

    signoff(&dir, "ops")
        .arg("scan")
        .assert()
        .success()
        .stdout(predicate::str::contains("No drift"));
}

// ─── Status ──────────────────────────────────────────────────────

#[test]
fn status_counts_requests() {
    let dir = init_project();
    for title in ["A", "B", "C"] {
        signoff(&dir, "ops")
            .args(["add", "--set", &format!("Title={title}")])
            .assert()
            .success();
    }
    signoff(&dir, "alice")
        .args(["approve", "--row", "2", "--row", "3"])
        .assert()
        .success();

    signoff(&dir, "ops")
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Requests (3)"))
        .stdout(predicate::str::contains("chain intact"));
}
