pub mod jsonl_ledger_store;
pub mod memory_ledger_store;
