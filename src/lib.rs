//! Row approvals with drift detection and a hash-chained audit log.
//!
//! The `core` layer holds the approval state machine, reapproval and
//! drift logic behind storage ports; `adapters` provides file-backed and
//! in-memory implementations of those ports.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
