//! HTTP routes

pub mod health;
pub mod notifications;

use crate::state::AppState;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

/// Build the service router (without middleware)
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/notifications/login",
            post(notifications::send_login_notification),
        )
        .route(
            "/notifications/send",
            post(notifications::send_custom_notification),
        )
        .route("/health", get(health::health_check))
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
}

async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Ruta no encontrada" })),
    )
        .into_response()
}

async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "error": "Método no permitido" })),
    )
        .into_response()
}
