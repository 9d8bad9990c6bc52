use crate::core::models::RunConfig;
use crate::core::settings::AccountSettings;
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("user UID is required")]
    MissingUid,
    #[error("e-mail is required")]
    MissingEmail,
    #[error("device ID is required")]
    MissingDeviceId,
    #[error("invalid e-mail format")]
    InvalidEmail,
    #[error("polling interval must be at least one second")]
    InvalidInterval,
}

impl ValidationError {
    /// Name of the settings field that failed.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingUid => "uid",
            ValidationError::MissingEmail | ValidationError::InvalidEmail => "email",
            ValidationError::MissingDeviceId => "device_id",
            ValidationError::InvalidInterval => "interval",
        }
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid email regex")
    })
}

pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

pub fn validate(candidate: &AccountSettings) -> Result<RunConfig, ValidationError> {
    let uid = candidate.uid.trim();
    let email = candidate.email.trim();
    let device_id = candidate.device_id.trim();

    if uid.is_empty() {
        return Err(ValidationError::MissingUid);
    }
    if email.is_empty() {
        return Err(ValidationError::MissingEmail);
    }
    if device_id.is_empty() {
        return Err(ValidationError::MissingDeviceId);
    }
    if !is_valid_email(email) {
        return Err(ValidationError::InvalidEmail);
    }
    if candidate.interval == 0 {
        return Err(ValidationError::InvalidInterval);
    }

    Ok(RunConfig {
        uid: uid.to_string(),
        email: email.to_string(),
        device_id: device_id.to_string(),
        interval: Duration::from_secs(candidate.interval),
    })
}
