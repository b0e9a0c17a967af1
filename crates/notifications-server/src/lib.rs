//! ms-notifications: email notifications over HTTP
//!
//! Accepts JSON requests, obtains the service's OAuth2 credential, composes
//! an HTML email and submits it through the Gmail API.

pub mod config;
pub mod error;
pub mod routes;
pub mod server;
pub mod state;
pub mod templates;

pub use config::Config;
pub use error::ApiError;
pub use server::{build_router, run};
pub use state::AppState;
