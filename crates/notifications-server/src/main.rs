//! ms-notifications - email notification microservice
//!
//! `serve` runs the HTTP service. `authorize` is the one-time, interactive
//! bootstrap that stores the credential the service refreshes afterwards.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use notifications_auth::{OAuth2TokenSource, TokenSource, TokenStore};
use notifications_server::Config;
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_LOG_FILTER: &str =
    "ms_notifications=debug,notifications_server=debug,notifications_auth=debug,notifications_mail=debug,tower_http=debug";

#[derive(Parser)]
#[command(name = "ms-notifications", version, about = "Email notification microservice")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP service (default)
    Serve,
    /// Authorize the sender account in a browser and store the credential
    Authorize {
        /// Seconds to wait for the browser callback
        #[arg(long, default_value_t = 300)]
        timeout: u64,
    },
    /// Delete the stored credential
    Logout,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            tracing::info!(
                "Starting ms-notifications ({:?} credential mode)",
                config.auth_mode()
            );
            notifications_server::run(config).await
        }
        Command::Authorize { timeout } => authorize(&config, Duration::from_secs(timeout)).await,
        Command::Logout => {
            TokenStore::new(config.oauth.token_cache_path.clone())
                .delete()
                .await?;
            println!("Stored credential removed");
            Ok(())
        }
    }
}

async fn authorize(config: &Config, timeout: Duration) -> Result<()> {
    let source = OAuth2TokenSource::new(
        config.oauth.client_secrets_path.clone(),
        config.oauth.redirect_port,
    )
    .with_request_timeout(config.outbound_timeout())
    .with_callback_timeout(timeout);

    let tokens = source
        .authorize()
        .await
        .context("Authorization did not complete")?;

    if tokens.refresh_token.is_none() {
        tracing::warn!("Provider issued no refresh token; the service will need re-authorization when it expires");
    }

    let store = TokenStore::new(config.oauth.token_cache_path.clone());
    store.save(&tokens).await?;
    println!("Credential stored at {}", store.path().display());
    Ok(())
}
