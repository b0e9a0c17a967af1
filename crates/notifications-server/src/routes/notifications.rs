//! Notification endpoints

use crate::error::ApiError;
use crate::state::AppState;
use crate::templates;
use axum::{body::Bytes, extract::rejection::BytesRejection, extract::State, Json};
use notifications_mail::{compose, SendResult, AUTHENTICATED_USER};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

const SENT_MESSAGE: &str = "Notificación enviada correctamente";

#[derive(Debug, Serialize)]
pub struct LoginNotificationResponse {
    pub success: bool,
    pub message: &'static str,
    pub message_id: String,
    pub email_sent_to: String,
}

#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub success: bool,
    pub message: &'static str,
    pub message_id: String,
}

/// POST /notifications/login
pub async fn send_login_notification(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<LoginNotificationResponse>, ApiError> {
    let fields = parse_object(&body?);

    let email = string_field(&fields, "email")
        .ok_or_else(|| ApiError::Validation("Email es requerido".to_string()))?;
    let user_name = string_field(&fields, "user_name").unwrap_or_else(|| "Usuario".to_string());
    let login_time = string_field(&fields, "login_time").unwrap_or_else(|| "Ahora".to_string());

    let html = templates::login_alert(&user_name, &email, &login_time);
    let message_id = deliver(&state, &email, templates::LOGIN_SUBJECT, &html).await?;

    Ok(Json(LoginNotificationResponse {
        success: true,
        message: SENT_MESSAGE,
        message_id,
        email_sent_to: email,
    }))
}

/// POST /notifications/send
pub async fn send_custom_notification(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<NotificationResponse>, ApiError> {
    let fields = parse_object(&body?);

    let email = required(&fields, "email")?;
    let subject = required(&fields, "subject")?;
    let message = required(&fields, "message")?;
    let html_content = string_field(&fields, "html_content");

    let html = templates::notification(&message, html_content.as_deref());
    let message_id = deliver(&state, &email, &subject, &html).await?;

    Ok(Json(NotificationResponse {
        success: true,
        message: SENT_MESSAGE,
        message_id,
    }))
}

/// Authenticate, compose and send; every stage may short-circuit
async fn deliver(
    state: &AppState,
    recipient: &str,
    subject: &str,
    html: &str,
) -> Result<String, ApiError> {
    let access_token = state.credentials.access_token().await?;
    let message = compose(&state.config.mail.sender, recipient, subject, html)?;

    match state
        .mailer
        .send(&access_token, AUTHENTICATED_USER, &message)
        .await
    {
        SendResult::Sent { message_id } => {
            info!("Notification sent to {} (id {})", recipient, message_id);
            Ok(message_id)
        }
        SendResult::Failed { error } => Err(ApiError::Provider(error)),
    }
}

/// A body that is absent, not JSON, or not an object counts as empty
fn parse_object(body: &[u8]) -> Map<String, Value> {
    match serde_json::from_slice(body) {
        Ok(Value::Object(fields)) => fields,
        _ => Map::new(),
    }
}

/// Only string values count as present
fn string_field(fields: &Map<String, Value>, name: &str) -> Option<String> {
    fields.get(name).and_then(Value::as_str).map(str::to_string)
}

fn required(fields: &Map<String, Value>, name: &str) -> Result<String, ApiError> {
    string_field(fields, name).ok_or_else(|| ApiError::missing_field(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_object_is_lenient() {
        assert!(parse_object(b"").is_empty());
        assert!(parse_object(b"not json").is_empty());
        assert!(parse_object(b"[1, 2]").is_empty());
        assert_eq!(parse_object(br#"{"email": "a@b.com"}"#).len(), 1);
    }

    #[test]
    fn test_non_string_fields_are_missing() {
        let fields = parse_object(br#"{"email": 42, "subject": null, "message": "hi"}"#);
        assert_eq!(string_field(&fields, "email"), None);
        assert_eq!(string_field(&fields, "subject"), None);
        assert_eq!(string_field(&fields, "message").as_deref(), Some("hi"));
    }
}
