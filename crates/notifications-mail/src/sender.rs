//! Uniform send interface used by the HTTP layer

use crate::EncodedMessage;
use async_trait::async_trait;

/// Mailbox alias for the authenticated account
pub const AUTHENTICATED_USER: &str = "me";

/// Outcome of one send attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendResult {
    /// The provider accepted the message
    Sent { message_id: String },
    /// The provider (or the way to it) failed
    Failed { error: String },
}

impl SendResult {
    pub fn is_success(&self) -> bool {
        matches!(self, SendResult::Sent { .. })
    }
}

/// Submits encoded messages to a mail provider.
///
/// Implementations never fail: every provider-side problem is reported as
/// [`SendResult::Failed`] so callers can always render a response.
#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send(&self, access_token: &str, user_id: &str, message: &EncodedMessage)
        -> SendResult;
}
