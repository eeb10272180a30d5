//! API request handlers for blueprint operations

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Path, Query, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use blueprint_common::Error;
use blueprint_mapper::schema::hosted::{
    BlueprintResponse, BlueprintsResponse, ComposeResponse, CreateBlueprintRequest,
    CreateBlueprintResponse, Customizations,
};
use blueprint_mapper::{ExportFile, ImportPreview, SubmitContext, WizardState};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::AppState;

/// Request to import a blueprint file
#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    /// Original file name, used to pick the parser
    pub filename: String,

    /// Raw file content
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub customizations: Customizations,
}

/// Response from validation
#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    /// Whether the customizations can be submitted
    pub valid: bool,

    /// Reason when invalid
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub state: WizardState,

    /// Id of the blueprint being exported, if it was saved
    #[serde(default)]
    pub parent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StateRequest {
    pub state: WizardState,
}

#[derive(Debug, Deserialize)]
pub struct BlueprintRequest {
    pub blueprint: BlueprintResponse,
}

/// Request to save (and optionally build) a new blueprint
#[derive(Debug, Deserialize)]
pub struct CreateRequest {
    pub state: WizardState,

    /// Start a compose once the blueprint is created
    #[serde(default)]
    pub build: bool,
}

#[derive(Debug, Serialize)]
pub struct CreateResponse {
    pub id: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub composes: Vec<ComposeResponse>,
}

#[derive(Debug, Deserialize)]
pub struct VersionQuery {
    pub version: Option<u32>,
}

/// API Error type
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub title: String,
    pub detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "title": self.title,
            "detail": self.detail,
        });

        (self.status, Json(body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match &err {
            Error::Collaborator(_) => StatusCode::BAD_GATEWAY,
            Error::JsonSerialization(_) | Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNPROCESSABLE_ENTITY,
        };

        ApiError {
            status,
            title: err.title().to_string(),
            detail: err.detail(),
        }
    }
}

/// JSON body extractor whose rejections use the `{title, detail}` error body
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => {
                info!("Rejected request body: {}", rejection.body_text());
                Err(ApiError {
                    status: rejection.status(),
                    title: "Invalid request body".to_string(),
                    detail: rejection.body_text(),
                })
            }
        }
    }
}

/// Collaborator failures surface once, with their context chain
fn collaborator_error(err: anyhow::Error) -> ApiError {
    error!("Collaborator request failed: {:#}", err);
    Error::Collaborator(format!("{:#}", err)).into()
}

fn submit_context(state: &AppState) -> SubmitContext {
    SubmitContext {
        organization_id: state.organization_id,
    }
}

/// Health check endpoint
pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "blueprint-api"
    }))
}

/// Import a blueprint file into wizard state
pub async fn import_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<ImportRequest>,
) -> Result<Json<ImportPreview>, ApiError> {
    info!("Importing blueprint file: {}", payload.filename);

    match state.engine.import(&payload.content, &payload.filename).await {
        Ok(preview) => {
            if !preview.warnings.is_empty() {
                warn!(
                    "Import of {} finished with {} warnings",
                    payload.filename,
                    preview.warnings.len()
                );
            }
            Ok(Json(preview))
        }
        Err(e) => {
            info!("Import rejected: {}", e);
            Err(e.into())
        }
    }
}

/// Check customizations against the validation gate
pub async fn validate_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<ValidateRequest>,
) -> Json<ValidateResponse> {
    info!("Validating customizations");

    match state.engine.validate(&payload.customizations) {
        Ok(()) => Json(ValidateResponse {
            valid: true,
            error: None,
        }),
        Err(e) => Json(ValidateResponse {
            valid: false,
            error: Some(e.detail()),
        }),
    }
}

/// Render wizard state as a downloadable file
pub async fn export_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<ExportRequest>,
) -> Result<Json<ExportFile>, ApiError> {
    info!("Exporting blueprint: {}", payload.state.name);

    let file = state
        .engine
        .export(&payload.state, payload.parent_id.as_deref())?;
    Ok(Json(file))
}

/// Preview the request that a submit would send
pub async fn request_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<StateRequest>,
) -> Result<Json<CreateBlueprintRequest>, ApiError> {
    info!("Building request for blueprint: {}", payload.state.name);

    let request = state
        .engine
        .build_request(&payload.state, &submit_context(&state))?;
    Ok(Json(request))
}

/// Map a hosted blueprint to wizard state
pub async fn state_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<BlueprintRequest>,
) -> Result<Json<WizardState>, ApiError> {
    info!("Mapping blueprint {} to wizard state", payload.blueprint.id);

    Ok(Json(state.engine.to_state(&payload.blueprint)?))
}

/// Create a blueprint, then compose it if requested
pub async fn create_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<CreateRequest>,
) -> Result<Json<CreateResponse>, ApiError> {
    info!("Creating blueprint: {}", payload.state.name);

    // Fails before any network request
    let request = state
        .engine
        .build_request(&payload.state, &submit_context(&state))?;

    let created = state
        .backend
        .create_blueprint(&request)
        .await
        .map_err(collaborator_error)?;
    info!("Blueprint created: {}", created.id);

    let composes = if payload.build {
        let composes = state
            .backend
            .compose_blueprint(&created.id)
            .await
            .map_err(collaborator_error)?;
        info!("Started {} composes for {}", composes.len(), created.id);
        composes
    } else {
        Vec::new()
    };

    Ok(Json(CreateResponse {
        id: created.id,
        composes,
    }))
}

/// Replace an existing blueprint
pub async fn update_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<StateRequest>,
) -> Result<Json<CreateBlueprintResponse>, ApiError> {
    info!("Updating blueprint: {}", id);

    let request = state
        .engine
        .build_request(&payload.state, &submit_context(&state))?;
    let updated = state
        .backend
        .update_blueprint(&id, &request)
        .await
        .map_err(collaborator_error)?;

    Ok(Json(updated))
}

pub async fn delete_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    info!("Deleting blueprint: {}", id);

    state
        .backend
        .delete_blueprint(&id)
        .await
        .map_err(collaborator_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<BlueprintsResponse>, ApiError> {
    info!("Listing blueprints");

    let blueprints = state
        .backend
        .list_blueprints()
        .await
        .map_err(collaborator_error)?;
    Ok(Json(blueprints))
}

/// Load a stored blueprint as wizard state for editing
pub async fn get_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<VersionQuery>,
) -> Result<Json<WizardState>, ApiError> {
    info!("Loading blueprint {} for editing", id);

    let blueprint = state
        .backend
        .get_blueprint(&id, query.version)
        .await
        .map_err(collaborator_error)?
        .ok_or_else(|| ApiError {
            status: StatusCode::NOT_FOUND,
            title: "Blueprint not found".to_string(),
            detail: format!("no blueprint with id {}", id),
        })?;

    Ok(Json(state.engine.to_state(&blueprint)?))
}
