//! Clients for the external collaborators
//!
//! - `ContentSourcesClient`: bulk repository import
//! - `ImageBuilderClient`: blueprint CRUD and compose

use anyhow::{Context, Result};
use async_trait::async_trait;
use blueprint_mapper::schema::hosted::{
    BlueprintResponse, BlueprintsResponse, ComposeResponse, CreateBlueprintRequest,
    CreateBlueprintResponse,
};
use blueprint_mapper::{ApiRepositoryImportResponse, ApiRepositoryRequest, RepositoryImporter};
use tracing::debug;

/// Blueprint CRUD and compose collaborator
#[async_trait]
pub trait BlueprintBackend: Send + Sync {
    async fn create_blueprint(
        &self,
        request: &CreateBlueprintRequest,
    ) -> Result<CreateBlueprintResponse>;

    async fn update_blueprint(
        &self,
        id: &str,
        request: &CreateBlueprintRequest,
    ) -> Result<CreateBlueprintResponse>;

    async fn delete_blueprint(&self, id: &str) -> Result<()>;

    async fn list_blueprints(&self) -> Result<BlueprintsResponse>;

    /// Fetch one blueprint, optionally at a specific version.
    /// Returns `None` when the backend does not know the id.
    async fn get_blueprint(&self, id: &str, version: Option<u32>)
        -> Result<Option<BlueprintResponse>>;

    /// Start a build for every image request of the blueprint
    async fn compose_blueprint(&self, id: &str) -> Result<Vec<ComposeResponse>>;
}

/// Fail on any non-success status, keeping the body for context
async fn ensure_success(response: reqwest::Response, action: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    anyhow::bail!("Failed to {}: {} {}", action, status, body)
}

/// Client for the content-sources service
pub struct ContentSourcesClient {
    base_url: String,
    client: reqwest::Client,
}

impl ContentSourcesClient {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl RepositoryImporter for ContentSourcesClient {
    async fn bulk_import(
        &self,
        requests: Vec<ApiRepositoryRequest>,
    ) -> Result<Vec<ApiRepositoryImportResponse>> {
        let url = format!("{}/repositories/bulk_import/", self.base_url);
        debug!("Importing {} repositories via {}", requests.len(), url);

        let response = self.client.post(&url).json(&requests).send().await?;
        let response = ensure_success(response, "import repositories").await?;

        response
            .json()
            .await
            .context("Failed to parse repository import response")
    }
}

/// Client for the image-builder service
pub struct ImageBuilderClient {
    base_url: String,
    client: reqwest::Client,
}

impl ImageBuilderClient {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn blueprint_url(&self, id: &str) -> String {
        format!("{}/blueprints/{}", self.base_url, id)
    }
}

#[async_trait]
impl BlueprintBackend for ImageBuilderClient {
    async fn create_blueprint(
        &self,
        request: &CreateBlueprintRequest,
    ) -> Result<CreateBlueprintResponse> {
        let url = format!("{}/blueprints", self.base_url);
        debug!("Creating blueprint '{}' at {}", request.name, url);

        let response = self.client.post(&url).json(request).send().await?;
        ensure_success(response, "create blueprint")
            .await?
            .json()
            .await
            .context("Failed to parse create blueprint response")
    }

    async fn update_blueprint(
        &self,
        id: &str,
        request: &CreateBlueprintRequest,
    ) -> Result<CreateBlueprintResponse> {
        let url = self.blueprint_url(id);
        debug!("Updating blueprint at {}", url);

        let response = self.client.put(&url).json(request).send().await?;
        ensure_success(response, "update blueprint")
            .await?
            .json()
            .await
            .context("Failed to parse update blueprint response")
    }

    async fn delete_blueprint(&self, id: &str) -> Result<()> {
        let url = self.blueprint_url(id);
        debug!("Deleting blueprint at {}", url);

        let response = self.client.delete(&url).send().await?;
        ensure_success(response, "delete blueprint").await?;
        Ok(())
    }

    async fn list_blueprints(&self) -> Result<BlueprintsResponse> {
        let url = format!("{}/blueprints", self.base_url);
        debug!("Listing blueprints from {}", url);

        let response = self.client.get(&url).send().await?;
        ensure_success(response, "list blueprints")
            .await?
            .json()
            .await
            .context("Failed to parse blueprint list")
    }

    async fn get_blueprint(
        &self,
        id: &str,
        version: Option<u32>,
    ) -> Result<Option<BlueprintResponse>> {
        let url = self.blueprint_url(id);
        debug!("Fetching blueprint from {}", url);

        let mut request = self.client.get(&url);
        if let Some(version) = version {
            request = request.query(&[("version", version)]);
        }
        let response = request.send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let blueprint = ensure_success(response, "fetch blueprint")
            .await?
            .json()
            .await
            .context("Failed to parse blueprint")?;
        Ok(Some(blueprint))
    }

    async fn compose_blueprint(&self, id: &str) -> Result<Vec<ComposeResponse>> {
        let url = format!("{}/compose", self.blueprint_url(id));
        debug!("Composing blueprint via {}", url);

        let response = self.client.post(&url).send().await?;
        ensure_success(response, "compose blueprint")
            .await?
            .json()
            .await
            .context("Failed to parse compose response")
    }
}
