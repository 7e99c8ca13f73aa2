use anyhow::Result;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use soundprint_api::{
    config::Config,
    db::{create_pool, create_redis_client, Cache, PgFeedbackStore},
    routes::{create_router, AppState},
    services::{
        providers::{HttpCatalogProvider, HttpContextInterpreter},
        PipelineSettings,
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("soundprint_api=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting soundprint-api");

    let pool = create_pool(&config.database_url).await?;
    tracing::info!("Connected to database");

    let redis_client = create_redis_client(&config.redis_url)?;
    let (cache, cache_writer) = Cache::new(redis_client).await;

    let catalog = HttpCatalogProvider::new(
        cache.clone(),
        config.catalog_api_key.clone(),
        config.catalog_api_url.clone(),
    );
    let interpreter = HttpContextInterpreter::new(
        cache,
        config.interpreter_api_url.clone(),
        config.interpreter_api_key.clone(),
        config.context_cache_ttl,
    );

    let state = Arc::new(AppState {
        catalog: Arc::new(catalog),
        interpreter: Arc::new(interpreter),
        store: Arc::new(PgFeedbackStore::new(pool)),
        settings: PipelineSettings::from(&config),
    });

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    tracing::info!(address = %config.bind_address(), "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Flush cache writes queued by in-flight requests
    cache_writer.shutdown().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
