//! Juris Web Server
//!
//! Run with: cargo run -p juris-web

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use juris_config::Config;
use juris_llm::HttpTransport;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Secrets usually live in .env during development
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("juris=debug,info")),
        )
        .init();

    info!("Starting Juris Web Server...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = Config::load().context("loading juris.toml")?;
    let credentials = config.resolve_credentials();
    if credentials.is_empty() {
        warn!(
            "No API keys found in the environment. Set GEMINI_API_KEY (or the variables \
             listed under [[credentials]] in juris.toml); every analysis will fail until then."
        );
    }
    info!(
        models = config.models.len(),
        credentials = credentials.len(),
        max_retries = config.retry.max_retries_per_pair,
        "fallback matrix configured"
    );

    let state = juris_web::state::AppState::from_config(&config, credentials, Arc::new(HttpTransport::new()));
    let app = juris_web::router::build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.server.host, config.server.port))?;
    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
