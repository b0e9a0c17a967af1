//! Error types for the auth module

use thiserror::Error;

/// Result type for auth operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Errors that can occur while obtaining a credential
#[derive(Debug, Error)]
pub enum AuthError {
    /// No usable credential and the provider may not start an interactive flow
    #[error("No valid credential available; run `ms-notifications authorize` to bootstrap one")]
    ReauthorizationRequired,

    /// OAuth2 authorization failed
    #[error("OAuth2 authorization failed: {0}")]
    AuthorizationFailed(String),

    /// Token exchange or refresh failed
    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    /// Failed to run the local callback server
    #[error("Failed to start callback server: {0}")]
    CallbackServerFailed(String),

    /// An outbound call to the OAuth2 provider did not finish in time
    #[error("Timed out after {0}s waiting for the OAuth2 provider")]
    Timeout(u64),

    /// Credential cache could not be read or written
    #[error("Credential storage error: {0}")]
    StorageError(String),

    /// Missing or invalid client secrets
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
