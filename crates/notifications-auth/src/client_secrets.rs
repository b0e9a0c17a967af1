//! OAuth2 client secrets as downloaded from the provider console

use crate::{AuthError, AuthResult};
use serde::Deserialize;
use std::path::Path;

/// Client credentials identifying this service to the OAuth2 provider
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

/// The console wraps the secrets in an application-type key
#[derive(Deserialize)]
struct SecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

fn default_auth_uri() -> String {
    crate::gmail::AUTH_URL.to_string()
}

fn default_token_uri() -> String {
    crate::gmail::TOKEN_URL.to_string()
}

impl ClientSecrets {
    /// Parse the JSON document (`{"installed": {...}}` or `{"web": {...}}`)
    pub fn from_json(json: &str) -> AuthResult<Self> {
        let file: SecretsFile = serde_json::from_str(json)
            .map_err(|e| AuthError::InvalidConfig(format!("Malformed client secrets: {}", e)))?;

        let secrets = file.installed.or(file.web).ok_or_else(|| {
            AuthError::InvalidConfig(
                "Client secrets must contain an \"installed\" or \"web\" section".to_string(),
            )
        })?;

        if secrets.client_id.trim().is_empty() {
            return Err(AuthError::InvalidConfig("client_id is empty".to_string()));
        }

        Ok(secrets)
    }

    /// Read and parse a client secrets file
    pub async fn from_file(path: impl AsRef<Path>) -> AuthResult<Self> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path).await.map_err(|e| {
            AuthError::InvalidConfig(format!(
                "Cannot read client secrets at {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&json)
    }
}
