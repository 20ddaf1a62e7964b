use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Credential errors
    #[error("Invalid credential identifier: {0}")]
    InvalidCredential(String),

    // Time errors
    #[error("Invalid time zone rule '{rule}': {reason}")]
    InvalidTimeZone { rule: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing configuration key: {0}")]
    MissingConfig(String),

    #[error("Malformed configuration: {0}")]
    ConfigFormat(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn time_zone(rule: &str, reason: impl Into<String>) -> Self {
        Error::InvalidTimeZone {
            rule: rule.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
