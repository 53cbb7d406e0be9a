pub mod file_lock;
pub mod process_lock;
