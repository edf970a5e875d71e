pub mod config;
pub mod format;
pub mod object_storage;
