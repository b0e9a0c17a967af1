//! Mail composition and delivery for ms-notifications
//!
//! Builds single-part HTML MIME messages and submits them through the
//! Gmail API with a send-only credential.

mod error;
pub mod gmail;
mod message;
mod sender;

pub use error::{MailError, MailResult};
pub use gmail::{GmailClient, SentMessage};
pub use message::{compose, EncodedMessage, OutgoingMessage};
pub use sender::{MailSender, SendResult, AUTHENTICATED_USER};
