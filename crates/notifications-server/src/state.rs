//! Shared application state

use crate::config::Config;
use anyhow::{Context, Result};
use notifications_auth::{
    CachedCredentialProvider, CredentialProvider, OAuth2TokenSource, TokenStore,
};
use notifications_mail::{GmailClient, MailSender};
use std::sync::Arc;

/// Collaborators shared by every request handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub credentials: Arc<dyn CredentialProvider>,
    pub mailer: Arc<dyn MailSender>,
}

impl AppState {
    pub fn new(
        config: Config,
        credentials: Arc<dyn CredentialProvider>,
        mailer: Arc<dyn MailSender>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            credentials,
            mailer,
        }
    }

    /// Wire the production collaborators: file-cached OAuth2 credential and Gmail API
    pub fn from_config(config: Config) -> Result<Self> {
        let source = OAuth2TokenSource::new(
            config.oauth.client_secrets_path.clone(),
            config.oauth.redirect_port,
        )
        .with_request_timeout(config.outbound_timeout());

        let credentials = CachedCredentialProvider::new(
            TokenStore::new(config.oauth.token_cache_path.clone()),
            source,
            config.auth_mode(),
        );

        let mailer = GmailClient::with_base_url(
            config.mail.gmail_api_base.clone(),
            config.outbound_timeout(),
        )
        .context("Failed to build Gmail API client")?;

        Ok(Self::new(config, Arc::new(credentials), Arc::new(mailer)))
    }
}
