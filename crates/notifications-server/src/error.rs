//! HTTP error envelope
//!
//! Callers can tell a malformed request (400) from a failed attempt (500),
//! but every failed attempt shares the same `{success: false, error}` shape.

use axum::{
    extract::rejection::BytesRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use notifications_auth::AuthError;
use notifications_mail::MailError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// A required field is missing from the request body
    #[error("{0}")]
    Validation(String),

    /// The request body could not be read (e.g. over the size limit)
    #[error("{}", .0.body_text())]
    Body(#[from] BytesRejection),

    /// The mail provider rejected or failed the send
    #[error("{0}")]
    Provider(String),

    /// No credential could be obtained
    #[error("Error interno del servidor: {0}")]
    Auth(#[from] AuthError),

    /// The message could not be composed
    #[error("Error interno del servidor: {0}")]
    Mail(#[from] MailError),

    /// Anything else, including handler panics
    #[error("Error interno del servidor: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn missing_field(field: &str) -> Self {
        ApiError::Validation(format!("{} es requerido", field))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Body(rejection) => rejection.status(),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match &self {
            ApiError::Validation(message) => json!({ "error": message }),
            ApiError::Body(rejection) => {
                tracing::debug!("Rejected request body: {}", rejection.body_text());
                json!({ "error": rejection.body_text() })
            }
            ApiError::Provider(message) => {
                tracing::warn!("Notification not delivered: {}", message);
                json!({ "success": false, "error": message })
            }
            other => {
                tracing::error!("Notification request failed: {}", other);
                json!({ "success": false, "error": other.to_string() })
            }
        };

        (self.status_code(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(error: ApiError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_validation_is_bad_request() {
        let (status, body) = body_of(ApiError::missing_field("subject")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "subject es requerido" }));
    }

    #[tokio::test]
    async fn test_provider_error_keeps_description() {
        let (status, body) = body_of(ApiError::Provider("quota exceeded".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "success": false, "error": "quota exceeded" }));
    }

    #[tokio::test]
    async fn test_auth_error_is_wrapped() {
        let (status, body) = body_of(AuthError::ReauthorizationRequired.into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Error interno del servidor: "));
    }
}
