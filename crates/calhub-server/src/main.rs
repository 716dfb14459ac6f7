//! calhub service binary.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use calhub_core::{TracingConfig, init_tracing};
use calhub_server::{Aggregator, AppState, ServerResult, ServiceConfig, build_sources, router};
use calhub_sources::DocumentCache;

#[tokio::main]
async fn main() -> ServerResult<()> {
    // A .env file is optional; a missing one is not an error.
    dotenvy::dotenv().ok();

    let tracing_config = match std::env::var("CALHUB_LOG_FORMAT").as_deref() {
        Ok("json") => TracingConfig::json(),
        _ => TracingConfig::default(),
    };
    init_tracing(tracing_config)?;

    let config = ServiceConfig::from_env()?;
    let cache = Arc::new(DocumentCache::new(config.cache_ttl, config.cache_capacity));
    let sources = build_sources(&config, Arc::clone(&cache)).await?;
    info!(sources = sources.len(), "Configured calendar sources");

    let aggregator = Arc::new(Aggregator::new(sources, cache));
    let app = router(AppState::new(aggregator));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(addr = %addr, "calhub listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
