mod config;
mod errors;
mod models;
mod ranking;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::ranking::cache::ReferenceCache;
use crate::ranking::extract::{BoundedExtractor, Extractor};
use crate::ranking::profile::RoleCatalog;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first; every knob has a default.
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume ranking API v{}", env!("CARGO_PKG_VERSION"));

    // Role keyword catalog: closed set, shared read-only across runs
    let roles = Arc::new(RoleCatalog::builtin());
    info!("Role catalog loaded ({} roles)", roles.role_ids().len());

    // Bounded LRU over job-description reads
    let reference_cache = Arc::new(ReferenceCache::new(config.limits.reference_cache_capacity));

    // Extraction backend enforcing the size/page/wall-clock caps
    let extractor: Arc<dyn Extractor> = Arc::new(BoundedExtractor::new(config.limits));
    info!(
        "Extractor ready (size cap {} MB, page cap {}, budget {}s)",
        config.limits.max_file_bytes / (1024 * 1024),
        config.limits.max_pdf_pages,
        config.limits.extract_budget.as_secs()
    );

    let state = AppState {
        config: config.clone(),
        roles,
        reference_cache,
        extractor,
    };

    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
