pub mod config;
pub mod once;
pub mod status;
