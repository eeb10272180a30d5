//! Blueprint API Service
//!
//! REST API service for importing, validating, exporting and submitting
//! image blueprints.

use anyhow::{Context, Result};
use blueprint_api::clients::{ContentSourcesClient, ImageBuilderClient};
use blueprint_api::config::Config;
use blueprint_api::{create_router, AppState};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    info!("Starting Blueprint API Service");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        "Configuration loaded - listening on {}",
        config.api_address()
    );
    info!("Backend: {:?}", config.backend);
    info!("Image builder: {}", config.image_builder_url);
    info!("Content sources: {}", config.content_sources_url);

    // Create application state
    let state = AppState::new(
        config.engine_config(),
        Arc::new(ContentSourcesClient::new(config.content_sources_url.clone())),
        Arc::new(ImageBuilderClient::new(config.image_builder_url.clone())),
        config.organization_id,
    );

    // Create router
    let app = create_router(state);

    // Start server
    let listener = TcpListener::bind(&config.api_address())
        .await
        .with_context(|| format!("Failed to bind to {}", config.api_address()))?;

    info!("Blueprint API listening on {}", config.api_address());
    info!("Health check: http://{}/health", config.api_address());

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
