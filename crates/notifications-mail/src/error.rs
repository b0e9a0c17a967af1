//! Error types for mail operations

use thiserror::Error;

/// Result type for mail operations
pub type MailResult<T> = Result<T, MailError>;

/// Errors that can occur while composing or sending a message
#[derive(Debug, Error)]
pub enum MailError {
    /// Invalid email address
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// HTTP request to the mail API failed (connect, timeout, TLS)
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The mail API rejected the request
    #[error("Mail API error {status}: {body}")]
    ApiError { status: u16, body: String },

    /// Failed to parse a response
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

impl MailError {
    /// Human-readable description, preferring the provider's own message
    pub fn describe(&self) -> String {
        match self {
            MailError::ApiError { status, body } => {
                match serde_json::from_str::<serde_json::Value>(body)
                    .ok()
                    .as_ref()
                    .and_then(|v| v.pointer("/error/message"))
                    .and_then(|m| m.as_str())
                {
                    Some(message) => format!("{} ({})", message, status),
                    None => self.to_string(),
                }
            }
            other => other.to_string(),
        }
    }
}
