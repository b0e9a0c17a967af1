//! Credential lifecycle for ms-notifications
//!
//! Obtains, caches and refreshes the OAuth2 credential the service uses to
//! send mail on behalf of its configured account. The interactive
//! authorization flow is a separate bootstrap step; at runtime the
//! provider only loads and refreshes.

mod client_secrets;
mod error;
mod flow;
mod provider;
mod store;

pub use client_secrets::ClientSecrets;
pub use error::{AuthError, AuthResult};
pub use flow::{OAuth2Config, OAuth2Flow, TokenPair};
pub use provider::{
    AuthMode, CachedCredentialProvider, CredentialProvider, OAuth2TokenSource, TokenSource,
};
pub use store::TokenStore;

/// Gmail OAuth2 configuration
pub mod gmail {
    use super::{ClientSecrets, OAuth2Config};

    /// Send-only scope: the credential cannot read, list or delete mail
    pub const SEND_SCOPE: &str = "https://www.googleapis.com/auth/gmail.send";

    pub const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
    pub const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

    /// Create the Gmail OAuth2 configuration from downloaded client secrets
    pub fn oauth2_config(secrets: &ClientSecrets, redirect_port: u16) -> OAuth2Config {
        OAuth2Config {
            client_id: secrets.client_id.clone(),
            client_secret: secrets.client_secret.clone(),
            auth_url: secrets.auth_uri.clone(),
            token_url: secrets.token_uri.clone(),
            scopes: vec![SEND_SCOPE.to_string()],
            redirect_port,
        }
    }
}
