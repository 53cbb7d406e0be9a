pub mod approval_config;
pub mod audit_event;
pub mod chain_report;
pub mod log_filter;
pub mod outcome;
pub mod request;
pub mod row_guard;
pub mod status;
