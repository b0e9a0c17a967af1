//! Credential provider: hands out a currently valid access token
//!
//! The persisted credential is loaded, refreshed, or (only when allowed)
//! re-authorized behind one lock, so concurrent requests share a single
//! refresh instead of racing on the token file.

use crate::flow::DEFAULT_REQUEST_TIMEOUT;
use crate::{
    gmail, AuthError, AuthResult, ClientSecrets, OAuth2Config, OAuth2Flow, TokenPair, TokenStore,
};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Source of access tokens for outbound mail calls
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Return an access token that is valid right now
    async fn access_token(&self) -> AuthResult<String>;
}

/// The OAuth2 provider as seen by the credential cache
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Exchange a refresh token for a new credential
    async fn refresh(&self, refresh_token: &str) -> AuthResult<TokenPair>;

    /// Run the interactive authorization flow
    async fn authorize(&self) -> AuthResult<TokenPair>;
}

/// Whether the provider may fall back to the interactive flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    /// Load and refresh only; a missing or unrefreshable credential is an error
    #[default]
    Headless,
    /// Fall back to the browser-based authorization flow
    Interactive,
}

/// [`TokenSource`] backed by the real OAuth2 endpoints
#[derive(Debug, Clone)]
pub struct OAuth2TokenSource {
    secrets_path: PathBuf,
    redirect_port: u16,
    request_timeout: Duration,
    callback_timeout: Duration,
}

impl OAuth2TokenSource {
    pub fn new(secrets_path: impl Into<PathBuf>, redirect_port: u16) -> Self {
        Self {
            secrets_path: secrets_path.into(),
            redirect_port,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            callback_timeout: Duration::from_secs(300),
        }
    }

    /// Upper bound for token endpoint calls
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// How long the interactive flow waits for the browser callback
    pub fn with_callback_timeout(mut self, timeout: Duration) -> Self {
        self.callback_timeout = timeout;
        self
    }

    /// Build the flow configuration.
    ///
    /// Secrets are read on every call so a missing file fails the send
    /// that needed it rather than the whole process.
    async fn oauth2_config(&self) -> AuthResult<OAuth2Config> {
        let secrets = ClientSecrets::from_file(&self.secrets_path).await?;
        Ok(gmail::oauth2_config(&secrets, self.redirect_port))
    }
}

#[async_trait]
impl TokenSource for OAuth2TokenSource {
    async fn refresh(&self, refresh_token: &str) -> AuthResult<TokenPair> {
        OAuth2Flow::new(self.oauth2_config().await?)?
            .with_request_timeout(self.request_timeout)
            .refresh_token(refresh_token)
            .await
    }

    async fn authorize(&self) -> AuthResult<TokenPair> {
        let mut flow = OAuth2Flow::bind(self.oauth2_config().await?)
            .await?
            .with_request_timeout(self.request_timeout);
        let url = flow.get_auth_url();
        info!("Open this URL in a browser to authorize mail sending: {}", url);

        flow.wait_for_callback(self.callback_timeout).await
    }
}

/// Credential provider caching the token in memory and on disk
pub struct CachedCredentialProvider<S> {
    store: TokenStore,
    source: S,
    mode: AuthMode,
    cached: Mutex<Option<TokenPair>>,
}

impl<S: TokenSource> CachedCredentialProvider<S> {
    pub fn new(store: TokenStore, source: S, mode: AuthMode) -> Self {
        Self {
            store,
            source,
            mode,
            cached: Mutex::new(None),
        }
    }

    /// Return a valid credential, refreshing or re-authorizing as needed
    pub async fn credential(&self) -> AuthResult<TokenPair> {
        let mut cached = self.cached.lock().await;

        if let Some(tokens) = cached.as_ref().filter(|t| t.is_valid()) {
            return Ok(tokens.clone());
        }

        // The file may have been replaced out-of-band (e.g. by `authorize`)
        let current = self.store.load().await?;
        if let Some(tokens) = current.as_ref().filter(|t| t.is_valid()) {
            debug!("Using persisted credential");
            *cached = Some(tokens.clone());
            return Ok(tokens.clone());
        }

        if let Some(refresh_token) = current.as_ref().and_then(|t| t.refresh_token.as_deref()) {
            info!("Access token expired, refreshing");
            match self.source.refresh(refresh_token).await {
                Ok(tokens) => {
                    self.store.save(&tokens).await?;
                    *cached = Some(tokens.clone());
                    return Ok(tokens);
                }
                Err(e) => warn!("Token refresh failed: {}", e),
            }
        }

        match self.mode {
            AuthMode::Headless => {
                *cached = None;
                Err(AuthError::ReauthorizationRequired)
            }
            AuthMode::Interactive => {
                info!("No usable credential, starting interactive authorization");
                let tokens = self.source.authorize().await?;
                self.store.save(&tokens).await?;
                *cached = Some(tokens.clone());
                Ok(tokens)
            }
        }
    }
}

#[async_trait]
impl<S: TokenSource> CredentialProvider for CachedCredentialProvider<S> {
    async fn access_token(&self) -> AuthResult<String> {
        self.credential().await.map(|t| t.access_token)
    }
}
