//! Blueprint REST API
//!
//! HTTP front end for the blueprint engine. Imports, validation, export and
//! the submit/edit mappings run in-process; blueprint storage and builds are
//! delegated to the image-builder service and repository registration to the
//! content-sources service.
//!
//! ## Endpoints
//!
//! - `POST /api/blueprints/import` - Import a TOML or JSON blueprint file
//! - `POST /api/blueprints/validate` - Check customizations
//! - `POST /api/blueprints/export` - Render wizard state as a file
//! - `POST /api/blueprints/request` - Preview the create request for a state
//! - `POST /api/blueprints/state` - Map a hosted blueprint to wizard state
//! - `POST /api/blueprints` - Create, and optionally build, a blueprint
//! - `GET /api/blueprints` - List blueprints
//! - `GET /api/blueprints/{id}` - Load a blueprint for editing
//! - `PUT /api/blueprints/{id}` - Update a blueprint
//! - `DELETE /api/blueprints/{id}` - Delete a blueprint
//! - `GET /health` - Health check

pub mod clients;
pub mod config;
pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use blueprint_mapper::{BlueprintEngine, EngineConfig, RepositoryImporter};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::clients::BlueprintBackend;

/// Application state shared across handlers
pub struct AppState {
    pub engine: BlueprintEngine,

    /// Blueprint CRUD and compose collaborator
    pub backend: Arc<dyn BlueprintBackend>,

    /// Organization used for registration subscriptions
    pub organization_id: Option<u64>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        config: EngineConfig,
        importer: Arc<dyn RepositoryImporter>,
        backend: Arc<dyn BlueprintBackend>,
        organization_id: Option<u64>,
    ) -> Self {
        Self {
            engine: BlueprintEngine::new(config, importer),
            backend,
            organization_id,
        }
    }
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    let state = Arc::new(state);

    Router::new()
        // Health check
        .route("/health", get(handlers::health_handler))
        // In-process document operations
        .route("/api/blueprints/import", post(handlers::import_handler))
        .route("/api/blueprints/validate", post(handlers::validate_handler))
        .route("/api/blueprints/export", post(handlers::export_handler))
        .route("/api/blueprints/request", post(handlers::request_handler))
        .route("/api/blueprints/state", post(handlers::state_handler))
        // Stored blueprints
        .route(
            "/api/blueprints",
            get(handlers::list_handler).post(handlers::create_handler),
        )
        .route(
            "/api/blueprints/{id}",
            get(handlers::get_handler)
                .put(handlers::update_handler)
                .delete(handlers::delete_handler),
        )
        // Middleware
        .layer(
            CorsLayer::permissive(), // Allow all origins for development
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
