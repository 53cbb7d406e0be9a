pub mod ledger_store;
pub mod lock;
pub mod row_guards;
pub mod row_store;
