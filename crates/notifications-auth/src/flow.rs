//! OAuth2 authorization code flow with PKCE and a loopback callback
//!
//! The interactive half (`bind` / `get_auth_url` / `wait_for_callback`) is
//! only used by the out-of-band bootstrap; the server itself only refreshes.

use crate::{AuthError, AuthResult};
use oauth2::{
    basic::BasicClient, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken,
    PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, Scope, TokenResponse, TokenUrl,
};
use std::future::Future;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info};

/// Seconds before the real expiry at which a token is already treated as expired
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Default upper bound for a single token endpoint call
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// OAuth2 provider configuration
#[derive(Debug, Clone)]
pub struct OAuth2Config {
    /// OAuth2 client ID
    pub client_id: String,
    /// OAuth2 client secret
    pub client_secret: Option<String>,
    /// Authorization endpoint URL
    pub auth_url: String,
    /// Token endpoint URL
    pub token_url: String,
    /// Required scopes
    pub scopes: Vec<String>,
    /// Local port for the OAuth2 callback, 0 for an ephemeral port
    pub redirect_port: u16,
}

/// Persisted credential: access token plus what is needed to renew it
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TokenPair {
    /// Access token for API calls
    pub access_token: String,
    /// Refresh token for obtaining new access tokens
    pub refresh_token: Option<String>,
    /// Token expiration timestamp (Unix seconds)
    pub expires_at: Option<i64>,
}

impl TokenPair {
    /// Check if the access token is expired or about to expire
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at - chrono::Utc::now().timestamp() < EXPIRY_MARGIN_SECS,
            None => false,
        }
    }

    /// A token is usable as-is when it is present and not expired
    pub fn is_valid(&self) -> bool {
        !self.access_token.is_empty() && !self.is_expired()
    }

    fn from_response<T: TokenResponse<oauth2::basic::BasicTokenType>>(
        response: &T,
        previous_refresh_token: Option<&str>,
    ) -> Self {
        let expires_at = response
            .expires_in()
            .map(|duration| chrono::Utc::now().timestamp() + duration.as_secs() as i64);

        Self {
            access_token: response.access_token().secret().clone(),
            refresh_token: response
                .refresh_token()
                .map(|t| t.secret().clone())
                .or_else(|| previous_refresh_token.map(str::to_string)),
            expires_at,
        }
    }
}

/// Manages an OAuth2 authorization flow
pub struct OAuth2Flow {
    config: OAuth2Config,
    client: BasicClient,
    listener: Option<TcpListener>,
    pkce_verifier: Option<PkceCodeVerifier>,
    csrf_token: Option<CsrfToken>,
    request_timeout: Duration,
}

impl OAuth2Flow {
    /// Create a flow without a callback listener, enough for token refresh
    pub fn new(config: OAuth2Config) -> AuthResult<Self> {
        let client = build_client(&config, config.redirect_port)?;

        Ok(Self {
            config,
            client,
            listener: None,
            pkce_verifier: None,
            csrf_token: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    /// Create a flow and bind the loopback listener that receives the callback.
    ///
    /// The redirect URI is derived from the port actually bound, so a
    /// `redirect_port` of 0 picks an ephemeral port.
    pub async fn bind(config: OAuth2Config) -> AuthResult<Self> {
        let listener = TcpListener::bind(("127.0.0.1", config.redirect_port))
            .await
            .map_err(|e| AuthError::CallbackServerFailed(e.to_string()))?;
        let port = listener
            .local_addr()
            .map_err(|e| AuthError::CallbackServerFailed(e.to_string()))?
            .port();

        info!("Listening for OAuth2 callback on port {}", port);

        let client = build_client(&config, port)?;

        Ok(Self {
            config,
            client,
            listener: Some(listener),
            pkce_verifier: None,
            csrf_token: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    /// Bound every token endpoint call (code exchange and refresh)
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Generate the authorization URL for the user to visit
    pub fn get_auth_url(&mut self) -> String {
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let mut auth_request = self
            .client
            .authorize_url(CsrfToken::new_random)
            .set_pkce_challenge(pkce_challenge)
            // Without offline access the provider issues no refresh token
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent");

        for scope in &self.config.scopes {
            auth_request = auth_request.add_scope(Scope::new(scope.clone()));
        }

        let (auth_url, csrf_token) = auth_request.url();

        self.pkce_verifier = Some(pkce_verifier);
        self.csrf_token = Some(csrf_token);

        auth_url.to_string()
    }

    /// Wait for the OAuth2 callback and exchange the code for tokens
    pub async fn wait_for_callback(&mut self, timeout: Duration) -> AuthResult<TokenPair> {
        let pkce_verifier = self
            .pkce_verifier
            .take()
            .ok_or_else(|| AuthError::InvalidConfig("Auth URL not generated".to_string()))?;

        let csrf_token = self
            .csrf_token
            .take()
            .ok_or_else(|| AuthError::InvalidConfig("Auth URL not generated".to_string()))?;

        let listener = self.listener.take().ok_or_else(|| {
            AuthError::CallbackServerFailed("Flow was created without a listener".to_string())
        })?;

        let (mut stream, _) = tokio::time::timeout(timeout, listener.accept())
            .await
            .map_err(|_| AuthError::Timeout(timeout.as_secs()))?
            .map_err(|e| AuthError::CallbackServerFailed(e.to_string()))?;

        let mut request_line = String::new();
        BufReader::new(&mut stream)
            .read_line(&mut request_line)
            .await
            .map_err(|e| AuthError::CallbackServerFailed(e.to_string()))?;

        debug!("Received callback request: {}", request_line.trim());

        let (code, state) = match parse_callback_url(&request_line) {
            Ok(parsed) => parsed,
            Err(e) => {
                send_http_response(&mut stream, "Error", &e.to_string()).await;
                return Err(e);
            }
        };

        if state != *csrf_token.secret() {
            send_http_response(&mut stream, "Error", "Invalid state parameter").await;
            return Err(AuthError::AuthorizationFailed(
                "CSRF token mismatch".to_string(),
            ));
        }

        send_http_response(
            &mut stream,
            "Success",
            "Authorization complete. You can close this window.",
        )
        .await;

        let exchange = self
            .client
            .exchange_code(AuthorizationCode::new(code))
            .set_pkce_verifier(pkce_verifier)
            .request_async(oauth2::reqwest::async_http_client);
        let token_response = bounded(self.request_timeout, exchange)
            .await?
            .map_err(|e| AuthError::TokenExchangeFailed(e.to_string()))?;

        Ok(TokenPair::from_response(&token_response, None))
    }

    /// Refresh an access token using a refresh token
    pub async fn refresh_token(&self, refresh_token: &str) -> AuthResult<TokenPair> {
        let refresh_token_value = oauth2::RefreshToken::new(refresh_token.to_string());
        let refresh = self
            .client
            .exchange_refresh_token(&refresh_token_value)
            .request_async(oauth2::reqwest::async_http_client);
        let token_response = bounded(self.request_timeout, refresh)
            .await?
            .map_err(|e| AuthError::TokenExchangeFailed(e.to_string()))?;

        Ok(TokenPair::from_response(&token_response, Some(refresh_token)))
    }
}

/// Run a token endpoint call under `timeout`
async fn bounded<T>(timeout: Duration, request: impl Future<Output = T>) -> AuthResult<T> {
    tokio::time::timeout(timeout, request)
        .await
        .map_err(|_| AuthError::Timeout(timeout.as_secs()))
}

fn build_client(config: &OAuth2Config, redirect_port: u16) -> AuthResult<BasicClient> {
    let client_id = ClientId::new(config.client_id.clone());
    let client_secret = config.client_secret.clone().map(ClientSecret::new);
    let auth_url = AuthUrl::new(config.auth_url.clone())
        .map_err(|e| AuthError::InvalidConfig(format!("Invalid auth URL: {}", e)))?;
    let token_url = TokenUrl::new(config.token_url.clone())
        .map_err(|e| AuthError::InvalidConfig(format!("Invalid token URL: {}", e)))?;
    let redirect_url = RedirectUrl::new(format!("http://localhost:{}/", redirect_port))
        .map_err(|e| AuthError::InvalidConfig(format!("Invalid redirect URL: {}", e)))?;

    Ok(
        BasicClient::new(client_id, client_secret, auth_url, Some(token_url))
            .set_redirect_uri(redirect_url),
    )
}

/// Parse the authorization code and state from a callback request line
fn parse_callback_url(request_line: &str) -> AuthResult<(String, String)> {
    // Request line format: "GET /?code=xxx&state=yyy HTTP/1.1"
    let parts: Vec<&str> = request_line.split_whitespace().collect();
    if parts.len() < 2 {
        return Err(AuthError::AuthorizationFailed(
            "Invalid callback request".to_string(),
        ));
    }

    let url = url::Url::parse(&format!("http://localhost{}", parts[1]))
        .map_err(|e| AuthError::AuthorizationFailed(format!("Invalid callback URL: {}", e)))?;

    let mut code = None;
    let mut state = None;

    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.to_string()),
            "state" => state = Some(value.to_string()),
            "error" => {
                let description = url
                    .query_pairs()
                    .find(|(k, _)| k == "error_description")
                    .map(|(_, v)| v.to_string())
                    .unwrap_or_else(|| value.to_string());
                return Err(AuthError::AuthorizationFailed(description));
            }
            _ => {}
        }
    }

    match (code, state) {
        (Some(c), Some(s)) => Ok((c, s)),
        _ => Err(AuthError::AuthorizationFailed(
            "Missing code or state in callback".to_string(),
        )),
    }
}

/// Send an HTTP response to the browser
async fn send_http_response(stream: &mut TcpStream, title: &str, message: &str) {
    let body = format!(
        r#"<!DOCTYPE html>
<html>
<head><title>{} - ms-notifications</title></head>
<body style="font-family: system-ui, sans-serif; display: flex; justify-content: center; align-items: center; height: 100vh; margin: 0; background: #fafafa;">
    <div style="text-align: center; padding: 2rem; background: white; border-radius: 8px;">
        <h1 style="color: #333;">{}</h1>
        <p style="color: #666;">{}</p>
    </div>
</body>
</html>"#,
        title, title, message
    );

    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );

    if let Err(e) = stream.write_all(response.as_bytes()).await {
        debug!("Failed to write callback response: {}", e);
        return;
    }
    if let Err(e) = stream.flush().await {
        debug!("Failed to flush callback response: {}", e);
    }
}
