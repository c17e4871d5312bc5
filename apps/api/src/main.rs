mod config;
mod errors;
mod interview;
mod llm_client;
mod models;
mod resume;
mod routes;
mod session;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::GeminiClient;
use crate::resume::scratch::ScratchDir;
use crate::routes::build_router;
use crate::session::store::{spawn_idle_sweeper, SessionStore};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Interview Prep API v{}", env!("CARGO_PKG_VERSION"));

    // Clear uploads left over from a previous run
    let scratch = ScratchDir::new(config.upload_dir.clone());
    let wipe = scratch.wipe_all().await;
    for failure in &wipe.failures {
        warn!("Could not clear {}: {}", failure.path, failure.error);
    }
    tokio::fs::create_dir_all(&config.upload_dir).await?;

    // Initialize LLM client
    let llm = GeminiClient::new(config.gemini_api_key.clone());
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Build app state
    let state = AppState {
        llm: Arc::new(llm),
        sessions: SessionStore::new(),
        scratch,
        config: config.clone(),
    };

    if state.config.session_idle_ttl.is_zero() {
        info!("Idle session expiry disabled");
    } else {
        spawn_idle_sweeper(
            state.sessions.clone(),
            state.scratch.clone(),
            state.config.session_idle_ttl,
        );
        info!(
            "Idle sessions expire after {}s",
            state.config.session_idle_ttl.as_secs()
        );
    }

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the front end has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
