pub mod approvals;
pub mod audit_ledger;
pub mod drift_scanner;
pub mod hasher;
pub mod reapproval;
pub mod request_sheet;
pub mod state_machine;
