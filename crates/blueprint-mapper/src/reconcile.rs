//! Repository reconciler
//!
//! Repositories referenced by an imported blueprint are registered with the
//! content-sources collaborator in one batch call. Confirmed records replace
//! the document's references; failed entries are dropped and reported.
//! Nothing here aborts the import.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::schema::hosted::{BlueprintExport, CustomRepository};
use crate::schema::repositories::{ApiRepositoryImportResponse, ApiRepositoryRequest};

/// Bulk repository import collaborator
#[async_trait]
pub trait RepositoryImporter: Send + Sync {
    /// Import `requests` in a single call. Responses are positional.
    async fn bulk_import(
        &self,
        requests: Vec<ApiRepositoryRequest>,
    ) -> anyhow::Result<Vec<ApiRepositoryImportResponse>>;
}

/// One repository the collaborator did not confirm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryFailure {
    pub url: String,
    pub warnings: Vec<Value>,
}

/// Non-terminal problems carried on a successful import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImportWarning {
    /// A single repository could not be imported
    RepositoryImportFailed { url: String, warnings: Vec<Value> },

    /// The batch call itself failed and no repositories were imported
    RepositoryImportUnavailable { detail: String },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    pub confirmed: Vec<CustomRepository>,
    pub imported_urls: Vec<String>,
    pub failures: Vec<RepositoryFailure>,
    pub call_error: Option<String>,
}

impl Reconciliation {
    pub fn warnings(&self) -> Vec<ImportWarning> {
        if let Some(detail) = &self.call_error {
            return vec![ImportWarning::RepositoryImportUnavailable {
                detail: detail.clone(),
            }];
        }
        self.failures
            .iter()
            .map(|f| ImportWarning::RepositoryImportFailed {
                url: f.url.clone(),
                warnings: f.warnings.clone(),
            })
            .collect()
    }
}

/// Repository descriptors referenced by `export`
///
/// `content_sources` wins when present. Otherwise descriptors are derived from
/// `custom_repositories`, using the first base URL and the first GPG key.
pub fn collect_descriptors(export: &BlueprintExport) -> Vec<ApiRepositoryRequest> {
    if let Some(sources) = &export.content_sources {
        return sources
            .iter()
            .filter(|source| {
                let keep = !source.url.trim().is_empty();
                if !keep {
                    debug!("Skipping content source without a URL");
                }
                keep
            })
            .cloned()
            .collect();
    }

    export
        .customizations
        .custom_repositories
        .iter()
        .flatten()
        .filter_map(|repo| {
            let Some(url) = repo.baseurl.as_ref().and_then(|urls| urls.first()) else {
                debug!("Skipping repository '{}' without a base URL", repo.id);
                return None;
            };
            Some(ApiRepositoryRequest {
                name: repo.name.clone().or_else(|| Some(repo.id.clone())),
                url: url.clone(),
                gpg_key: first_gpg_key(repo),
                metadata_verification: repo.check_repo_gpg,
                module_hotfixes: repo.module_hotfixes,
                ..ApiRepositoryRequest::default()
            })
        })
        .collect()
}

fn first_gpg_key(repo: &CustomRepository) -> Option<String> {
    if let Some(key) = repo.gpgkey.as_ref().and_then(|keys| keys.first()) {
        return Some(key.clone());
    }
    repo.extra
        .get("gpgkeys")
        .and_then(Value::as_array)
        .and_then(|keys| keys.first())
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Import `requests` and sort the outcome into confirmed and failed entries
///
/// An empty list never reaches the collaborator.
pub async fn reconcile(
    importer: &dyn RepositoryImporter,
    requests: Vec<ApiRepositoryRequest>,
) -> Reconciliation {
    if requests.is_empty() {
        return Reconciliation::default();
    }

    let urls: Vec<String> = requests.iter().map(|r| r.url.clone()).collect();
    info!("Importing {} repositories", urls.len());

    let responses = match importer.bulk_import(requests.clone()).await {
        Ok(responses) => responses,
        Err(e) => {
            warn!("Repository import failed: {:#}", e);
            return Reconciliation {
                call_error: Some(format!("{:#}", e)),
                ..Reconciliation::default()
            };
        }
    };

    let mut outcome = Reconciliation::default();
    for (idx, request) in requests.iter().enumerate() {
        match responses.get(idx) {
            Some(response) if response.is_confirmed() => {
                outcome.imported_urls.push(request.url.clone());
                outcome.confirmed.push(confirmed_repository(request, response));
            }
            Some(response) => outcome.failures.push(RepositoryFailure {
                url: request.url.clone(),
                warnings: response.warnings.clone(),
            }),
            None => outcome.failures.push(RepositoryFailure {
                url: request.url.clone(),
                warnings: vec![Value::String("no response for repository".to_string())],
            }),
        }
    }

    if !outcome.failures.is_empty() {
        warn!(
            "{} of {} repositories were not imported",
            outcome.failures.len(),
            urls.len()
        );
    }
    outcome
}

fn confirmed_repository(
    request: &ApiRepositoryRequest,
    response: &ApiRepositoryImportResponse,
) -> CustomRepository {
    let url = response.url.clone().unwrap_or_else(|| request.url.clone());
    let gpg_key = response.gpg_key.clone().or_else(|| request.gpg_key.clone());

    CustomRepository {
        id: response.uuid.clone().unwrap_or_default(),
        name: response.name.clone().or_else(|| request.name.clone()),
        baseurl: Some(vec![url]),
        check_gpg: Some(gpg_key.is_some()),
        gpgkey: gpg_key.map(|key| vec![key]),
        check_repo_gpg: response
            .metadata_verification
            .or(request.metadata_verification),
        module_hotfixes: response.module_hotfixes.or(request.module_hotfixes),
        ..CustomRepository::default()
    }
}
