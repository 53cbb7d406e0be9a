pub mod add;
pub mod cell_args;
pub mod decide;
pub mod edit;
pub mod init;
pub mod log;
pub mod scan;
pub mod status;
pub mod verify;
