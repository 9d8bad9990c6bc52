pub mod escalation;
pub mod event_log;
pub mod models;
pub mod settings;
pub mod stats;
pub mod store;
pub mod validation;
