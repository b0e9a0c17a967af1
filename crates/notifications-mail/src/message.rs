//! MIME composition for outgoing notifications

use crate::{MailError, MailResult};
use base64::Engine;
use lettre::message::{header, Mailbox, Mailboxes, SinglePart};
use serde::Serialize;

/// Email message to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    /// From address
    pub from: String,
    /// To address
    pub to: String,
    /// Subject line
    pub subject: String,
    /// HTML body
    pub html_body: String,
}

/// Transport form of a message: the full MIME text, URL-safe base64 encoded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodedMessage {
    pub raw: String,
}

impl OutgoingMessage {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
        html_body: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            subject: subject.into(),
            html_body: html_body.into(),
        }
    }

    /// Render the message as a single `text/html` MIME part.
    ///
    /// No `Date` or `Message-ID` is added; the provider stamps both, which
    /// keeps the output a pure function of the message fields.
    pub fn to_mime(&self) -> MailResult<Vec<u8>> {
        let from = parse_mailbox(&self.from)?;
        let to = parse_mailbox(&self.to)?;

        let part = SinglePart::builder()
            .header(header::MIME_VERSION_1_0)
            .header(header::From::from(Mailboxes::from(from)))
            .header(header::To::from(Mailboxes::from(to)))
            .header(header::Subject::from(sanitize_header_value(&self.subject)))
            .header(header::ContentType::TEXT_HTML)
            .body(self.html_body.clone());

        Ok(part.formatted())
    }

    /// Encode the MIME text for the send API
    pub fn encode(&self) -> MailResult<EncodedMessage> {
        let mime = self.to_mime()?;
        Ok(EncodedMessage {
            raw: base64::engine::general_purpose::URL_SAFE.encode(mime),
        })
    }
}

/// Build and encode a message in one step
pub fn compose(
    sender: &str,
    recipient: &str,
    subject: &str,
    html_body: &str,
) -> MailResult<EncodedMessage> {
    OutgoingMessage::new(sender, recipient, subject, html_body).encode()
}

fn parse_mailbox(address: &str) -> MailResult<Mailbox> {
    address
        .trim()
        .parse()
        .map_err(|e| MailError::InvalidAddress(format!("{}: {}", address, e)))
}

/// Line breaks would start a new header; fold them into spaces
fn sanitize_header_value(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(encoded: &EncodedMessage) -> String {
        let bytes = base64::engine::general_purpose::URL_SAFE
            .decode(&encoded.raw)
            .unwrap();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_compose_sets_headers() {
        let encoded = compose("sender@example.com", "a@b.com", "Hello", "<p>Hi</p>").unwrap();
        let mime = decode(&encoded);

        assert!(mime.contains("MIME-Version: 1.0\r\n"));
        assert!(mime.contains("From: sender@example.com\r\n"));
        assert!(mime.contains("To: a@b.com\r\n"));
        assert!(mime.contains("Subject: Hello\r\n"));
        assert!(mime.contains("Content-Type: text/html; charset=utf-8\r\n"));
        assert!(mime.contains("<p>Hi</p>"));
        assert!(!mime.contains("Date:"));
        assert!(!mime.contains("Message-ID:"));
    }

    #[test]
    fn test_compose_is_deterministic() {
        let subject = "🔐 Notificación de Inicio de Sesión";
        let body = "<html><body><h1>🔐 Acceso</h1><p>Hola</p></body></html>";

        let first = compose("sender@example.com", "a@b.com", subject, body).unwrap();
        let second = compose("sender@example.com", "a@b.com", subject, body).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_raw_is_padded_url_safe_base64() {
        let encoded = compose("sender@example.com", "a@b.com", "Hi", "<p>x</p>").unwrap();
        assert!(!encoded.raw.contains('+'));
        assert!(!encoded.raw.contains('/'));
        assert_eq!(encoded.raw.len() % 4, 0);

        let json = serde_json::to_value(&encoded).unwrap();
        assert_eq!(json["raw"], encoded.raw);
    }

    #[test]
    fn test_non_ascii_subject_is_encoded() {
        let encoded = compose("sender@example.com", "a@b.com", "📢 Aviso", "<p>x</p>").unwrap();
        let mime = decode(&encoded);
        assert!(mime.contains("Subject: =?"));
    }

    #[test]
    fn test_subject_line_breaks_cannot_inject_headers() {
        let encoded = compose(
            "sender@example.com",
            "a@b.com",
            "Hi\r\nBcc: victim@example.com",
            "<p>x</p>",
        )
        .unwrap();
        let mime = decode(&encoded);
        assert!(!mime.contains("\r\nBcc:"));
        assert!(!mime.contains("\nBcc:"));
    }

    #[test]
    fn test_invalid_recipient_is_rejected() {
        let err = compose("sender@example.com", "not an address", "Hi", "x").unwrap_err();
        assert!(matches!(err, MailError::InvalidAddress(_)));

        let err = compose(
            "sender@example.com",
            "a@b.com\r\nBcc: victim@example.com",
            "Hi",
            "x",
        )
        .unwrap_err();
        assert!(matches!(err, MailError::InvalidAddress(_)));
    }
}
