mod account;
mod config;
mod db;
mod document;
mod drafts;
mod enhance;
mod errors;
mod import;
mod letters;
mod models;
mod routes;
mod settings;
mod state;
mod store;
mod sync;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::{create_pool, run_migrations};
use crate::routes::build_router;
use crate::settings::{AiConfig, AiSettings};
use crate::state::AppState;
use crate::store::{MemoryStore, PgStore, RecordStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting cvbuilder v{}", env!("CARGO_PKG_VERSION"));

    // Record store: PostgreSQL, or the in-process store for local runs
    let store: Arc<dyn RecordStore> = if config.uses_memory_store() {
        warn!("DATABASE_URL is memory://; records are lost on restart");
        Arc::new(MemoryStore::new())
    } else {
        let pool = create_pool(&config.database_url).await?;
        run_migrations(&pool).await?;
        Arc::new(PgStore::new(pool))
    };

    // AI settings slot, file-backed when AI_CONFIG_PATH is set
    let ai_settings = match &config.ai_config_path {
        Some(path) => AiSettings::load(path.clone()).await,
        None => AiSettings::in_memory(AiConfig::default()),
    };
    info!(
        "AI provider: {}",
        ai_settings.get().await.model.display_name()
    );

    info!("OCR webhook: {}", config.ocr_webhook_url);

    let state = AppState::new(store, ai_settings, config.clone())?;

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
