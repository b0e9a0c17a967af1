//! Configuration management for ms-notifications

use anyhow::{Context, Result};
use notifications_auth::AuthMode;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Service name reported by the health endpoint
pub const SERVICE_NAME: &str = "ms-notifications";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server host
    pub http_host: String,
    /// HTTP server port
    pub http_port: u16,
    /// Mail configuration
    pub mail: MailConfig,
    /// OAuth2 credential configuration
    pub oauth: OAuthConfig,
    /// Upper bound for any single call to the OAuth2 provider or mail API
    pub outbound_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    /// Fixed From address of every notification
    pub sender: String,
    /// Root of the Gmail REST API
    pub gmail_api_base: String,
}

#[derive(Debug, Clone)]
pub struct OAuthConfig {
    /// Client secrets file downloaded from the provider console
    pub client_secrets_path: PathBuf,
    /// Where the credential is cached between requests and restarts
    pub token_cache_path: PathBuf,
    /// Port for the authorization callback, 0 for an ephemeral port
    pub redirect_port: u16,
    /// Let the server itself run the browser flow when no credential is usable
    pub interactive: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_host: "0.0.0.0".to_string(),
            http_port: 5001,
            mail: MailConfig {
                sender: "juan.clavijo50057@ucaldas.edu.co".to_string(),
                gmail_api_base: notifications_mail::gmail::GMAIL_API_BASE.to_string(),
            },
            oauth: OAuthConfig {
                client_secrets_path: PathBuf::from("confidential/credentials.json"),
                token_cache_path: PathBuf::from("confidential/token.json"),
                redirect_port: 0,
                interactive: false,
            },
            outbound_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup; unset keys take defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            http_host: lookup("HTTP_HOST").unwrap_or(defaults.http_host),
            http_port: match lookup("HTTP_PORT") {
                Some(port) => port.parse().context("Invalid HTTP_PORT")?,
                None => defaults.http_port,
            },
            mail: MailConfig {
                sender: lookup("MAIL_SENDER").unwrap_or(defaults.mail.sender),
                gmail_api_base: lookup("GMAIL_API_BASE").unwrap_or(defaults.mail.gmail_api_base),
            },
            oauth: OAuthConfig {
                client_secrets_path: lookup("CLIENT_SECRETS_PATH")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.oauth.client_secrets_path),
                token_cache_path: lookup("TOKEN_CACHE_PATH")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.oauth.token_cache_path),
                redirect_port: match lookup("OAUTH_REDIRECT_PORT") {
                    Some(port) => port.parse().context("Invalid OAUTH_REDIRECT_PORT")?,
                    None => defaults.oauth.redirect_port,
                },
                interactive: lookup("OAUTH_INTERACTIVE")
                    .map(|s| s.to_lowercase() == "true")
                    .unwrap_or(defaults.oauth.interactive),
            },
            outbound_timeout_secs: match lookup("OUTBOUND_TIMEOUT_SECS") {
                Some(secs) => secs.parse().context("Invalid OUTBOUND_TIMEOUT_SECS")?,
                None => defaults.outbound_timeout_secs,
            },
        })
    }

    /// Get HTTP server address
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }

    pub fn outbound_timeout(&self) -> Duration {
        Duration::from_secs(self.outbound_timeout_secs)
    }

    pub fn auth_mode(&self) -> AuthMode {
        if self.oauth.interactive {
            AuthMode::Interactive
        } else {
            AuthMode::Headless
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.http_addr(), "0.0.0.0:5001");
        assert_eq!(config.auth_mode(), AuthMode::Headless);
        assert_eq!(config.outbound_timeout(), Duration::from_secs(30));
        assert_eq!(
            config.oauth.token_cache_path,
            PathBuf::from("confidential/token.json")
        );
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("HTTP_PORT", "8080"),
            ("MAIL_SENDER", "alerts@example.com"),
            ("OAUTH_INTERACTIVE", "TRUE"),
            ("OAUTH_REDIRECT_PORT", "8855"),
            ("OUTBOUND_TIMEOUT_SECS", "10"),
        ]))
        .unwrap();

        assert_eq!(config.http_port, 8080);
        assert_eq!(config.mail.sender, "alerts@example.com");
        assert_eq!(config.auth_mode(), AuthMode::Interactive);
        assert_eq!(config.oauth.redirect_port, 8855);
        assert_eq!(config.outbound_timeout_secs, 10);
    }

    #[test]
    fn test_invalid_port_is_error() {
        assert!(Config::from_lookup(lookup_from(&[("HTTP_PORT", "http")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("OUTBOUND_TIMEOUT_SECS", "-1")])).is_err());
    }
}
