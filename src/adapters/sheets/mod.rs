pub mod json_sheet_store;
pub mod memory_sheet_store;
pub mod sheet_document;
