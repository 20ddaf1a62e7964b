//! Error types for the remote services.

use thiserror::Error;

/// Failure of a single HTTP exchange before a response arrived.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("TLS configuration error: {0}")]
    Tls(String),

    #[error("HTTP error: {0}")]
    Other(String),

    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),
}

/// Sign-in failures.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Sign-in transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("Sign-in rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Malformed sign-in response: {0}")]
    MalformedResponse(String),

    #[error("Sign-in response has no idToken")]
    MissingToken,

    #[error("Session failed earlier and cannot sign in again: {0}")]
    SessionFailed(String),
}

/// Log submission failures.
#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("No token available, sign in first")]
    NoToken,

    #[error("Submission transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("Submission rejected with status {status}")]
    Rejected { status: u16, body: String },

    #[error("Failed to encode log entry: {0}")]
    Encode(#[from] serde_json::Error),
}

impl SubmitError {
    /// Returns `true` when no network call was attempted.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            SubmitError::NoToken
                | SubmitError::Encode(_)
                | SubmitError::Transport(TransportError::InvalidUrl(_))
        )
    }
}
