//! Gmail API email sending
//!
//! Sends pre-encoded MIME messages via
//! `POST /gmail/v1/users/{userId}/messages/send`. This needs nothing more
//! than the `gmail.send` scope.

use crate::{EncodedMessage, MailError, MailResult, MailSender, SendResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const GMAIL_API_BASE: &str = "https://gmail.googleapis.com";

/// Message resource returned by a successful send
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentMessage {
    pub id: String,
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub label_ids: Vec<String>,
}

pub struct GmailClient {
    client: reqwest::Client,
    base_url: String,
}

impl GmailClient {
    /// Create a client against the public Gmail API
    pub fn new(timeout: Duration) -> MailResult<Self> {
        Self::with_base_url(GMAIL_API_BASE, timeout)
    }

    /// Create a client against a different API root
    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> MailResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Submit a raw message on behalf of `user_id`
    pub async fn send_raw(
        &self,
        access_token: &str,
        user_id: &str,
        message: &EncodedMessage,
    ) -> MailResult<SentMessage> {
        let url = format!("{}/gmail/v1/users/{}/messages/send", self.base_url, user_id);
        debug!("Gmail: sending message, raw length {} bytes", message.raw.len());

        let response = self
            .client
            .post(&url)
            .bearer_auth(access_token)
            .json(message)
            .send()
            .await?;

        let status = response.status();
        debug!("Gmail send response status: {}", status);

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read response body".to_string());
            return Err(MailError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let sent: SentMessage = response
            .json()
            .await
            .map_err(|e| MailError::ParseError(e.to_string()))?;

        info!("Email sent successfully via Gmail API, id={}", sent.id);
        Ok(sent)
    }
}

#[async_trait]
impl MailSender for GmailClient {
    async fn send(
        &self,
        access_token: &str,
        user_id: &str,
        message: &EncodedMessage,
    ) -> SendResult {
        match self.send_raw(access_token, user_id, message).await {
            Ok(sent) => SendResult::Sent {
                message_id: sent.id,
            },
            Err(e) => {
                warn!("Gmail send failed: {}", e);
                SendResult::Failed {
                    error: e.describe(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn message() -> EncodedMessage {
        EncodedMessage {
            raw: "VG86IGFAYi5jb20NCg==".to_string(),
        }
    }

    async fn client_for(server: &MockServer) -> GmailClient {
        GmailClient::with_base_url(server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_send_success_returns_message_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/gmail/v1/users/me/messages/send"))
            .and(header("authorization", "Bearer token-1"))
            .and(body_json(serde_json::json!({ "raw": "VG86IGFAYi5jb20NCg==" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "18c1f",
                "threadId": "18c1f",
                "labelIds": ["SENT"]
            })))
            .expect(2)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let sent = client.send_raw("token-1", "me", &message()).await.unwrap();
        assert_eq!(sent.id, "18c1f");
        assert_eq!(sent.label_ids, vec!["SENT".to_string()]);

        let result = client.send("token-1", "me", &message()).await;
        assert_eq!(
            result,
            SendResult::Sent {
                message_id: "18c1f".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_provider_error_is_reported_not_raised() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/gmail/v1/users/me/messages/send"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": { "code": 429, "message": "quota exceeded" }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;

        let err = client.send_raw("t", "me", &message()).await.unwrap_err();
        assert!(matches!(err, MailError::ApiError { status: 429, .. }));

        let result = client.send("t", "me", &message()).await;
        assert_eq!(
            result,
            SendResult::Failed {
                error: "quota exceeded (429)".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_reported() {
        let client =
            GmailClient::with_base_url("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let result = client.send("t", "me", &message()).await;
        assert!(!result.is_success());
    }

    #[tokio::test]
    async fn test_stalled_provider_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/gmail/v1/users/me/messages/send"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(5))
                    .set_body_json(serde_json::json!({ "id": "late" })),
            )
            .mount(&server)
            .await;

        let client =
            GmailClient::with_base_url(server.uri(), Duration::from_millis(200)).unwrap();

        let err = client.send_raw("t", "me", &message()).await.unwrap_err();
        assert!(matches!(err, MailError::RequestFailed(ref e) if e.is_timeout()));

        let result = client.send("t", "me", &message()).await;
        assert!(matches!(result, SendResult::Failed { .. }));
    }
}
