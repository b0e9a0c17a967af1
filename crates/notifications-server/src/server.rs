//! HTTP server assembly

use crate::config::Config;
use crate::error::ApiError;
use crate::routes;
use crate::state::AppState;
use anyhow::{Context, Result};
use axum::response::{IntoResponse, Response};
use axum::Router;
use std::any::Any;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::info;

/// Build the router with all middleware applied
pub fn build_router(state: AppState) -> Router {
    routes::routes()
        .with_state(state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        // Called by other services from any origin
        .layer(CorsLayer::permissive())
}

/// Bind and serve until interrupted
pub async fn run(config: Config) -> Result<()> {
    let addr = config.http_addr();
    let state = AppState::from_config(config)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("HTTP server stopped");
    Ok(())
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "unexpected panic".to_string()
    };

    ApiError::Internal(detail).into_response()
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
