mod audit;
mod config;
mod db;
mod errors;
mod footprint;
mod interview;
mod jobs;
mod proxy;
mod report;
mod resume;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::audit::PgAuditStore;
use crate::config::Config;
use crate::db::create_pool;
use crate::proxy::cache::ResponseCache;
use crate::proxy::upstream::HttpUpstream;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting career proxy API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (audit trail)
    let pool = create_pool(&config.database_url).await?;
    let audit = Arc::new(PgAuditStore::new(pool));

    // Initialize the upstream executor and the response cache
    let upstream = Arc::new(HttpUpstream::new(&config.upstream_base_url));
    info!("Upstream client initialized ({})", config.upstream_base_url);
    let cache = Arc::new(ResponseCache::new());

    // Build app state
    let state = AppState {
        upstream,
        cache,
        audit,
    };

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
