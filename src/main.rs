// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reelhouse API Server
//!
//! Serves accounts, collections, reviews and admin tools for the movie
//! discovery client, and proxies catalog requests to TMDB.

use reelhouse::{
    config::Config,
    db::{AccountStore, MemoryStore, PostgresStore},
    error::set_expose_internal_errors,
    services::TmdbClient,
    AppState,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        environment = ?config.environment,
        "Starting Reelhouse API"
    );
    set_expose_internal_errors(config.is_development());

    // Account store: Postgres when configured, otherwise in-process
    let store: Arc<dyn AccountStore> = match &config.database_url {
        Some(url) => {
            let store = PostgresStore::connect(url, config.database_max_connections).await?;
            store.migrate().await?;
            Arc::new(store)
        }
        None => {
            tracing::warn!(
                "DATABASE_URL not set; using in-memory account store (data is lost on restart)"
            );
            Arc::new(MemoryStore::new())
        }
    };

    let catalog = TmdbClient::new(
        &config.tmdb_base_url,
        config.tmdb_api_key.clone(),
        Duration::from_secs(config.tmdb_timeout_secs),
    )?;
    tracing::info!(base_url = %config.tmdb_base_url, "Catalog client initialized");

    // Build shared state
    let port = config.port;
    let state = Arc::new(AppState::new(config, store, Arc::new(catalog)));

    // Build router
    let app = reelhouse::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("reelhouse=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
