//! Configuration management for Blueprint API
//!
//! Loads configuration from environment variables with sensible defaults.

use anyhow::{Context, Result};
use blueprint_mapper::{Backend, EngineConfig};
use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API server host
    pub api_host: String,

    /// API server port
    pub api_port: u16,

    /// Base URL of the image-builder (blueprint CRUD and compose) API
    pub image_builder_url: String,

    /// Base URL of the content-sources (repository import) API
    pub content_sources_url: String,

    pub backend: Backend,

    /// Register referenced repositories when importing
    pub import_repositories: bool,

    /// Organization used for registration subscriptions
    pub organization_id: Option<u64>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists (for local development)
        dotenvy::dotenv().ok();

        let config = Config {
            api_host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),

            api_port: env::var("API_PORT")
                .unwrap_or_else(|_| "8086".to_string())
                .parse()
                .context("Invalid API_PORT")?,

            image_builder_url: env::var("IMAGE_BUILDER_URL")
                .unwrap_or_else(|_| "http://localhost:8087/api/image-builder/v1".to_string()),

            content_sources_url: env::var("CONTENT_SOURCES_URL")
                .unwrap_or_else(|_| "http://localhost:8088/api/content-sources/v1".to_string()),

            backend: env::var("BACKEND_MODE")
                .unwrap_or_else(|_| "hosted".to_string())
                .parse::<Backend>()
                .context("Invalid BACKEND_MODE")?,

            import_repositories: env::var("IMPORT_REPOSITORIES")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .context("Invalid IMPORT_REPOSITORIES")?,

            organization_id: env::var("ORGANIZATION_ID")
                .ok()
                .map(|id| id.parse::<u64>())
                .transpose()
                .context("Invalid ORGANIZATION_ID")?,
        };

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.api_port == 0 {
            anyhow::bail!("API_PORT must be greater than 0");
        }

        Ok(())
    }

    /// Get the API server address
    pub fn api_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            backend: self.backend,
            import_repositories: self.import_repositories,
        }
    }
}
