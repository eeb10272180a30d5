//! Repository records exchanged with the content-sources collaborator

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::hosted::Extra;

/// One repository to import
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiRepositoryRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpg_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_verification: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_hotfixes: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution_arch: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution_versions: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,

    #[serde(flatten)]
    pub extra: Extra,
}

/// Per-repository outcome of a bulk import
///
/// A confirmed record carries a `uuid` and no warnings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiRepositoryImportResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpg_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_verification: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_hotfixes: Option<bool>,

    #[serde(default)]
    pub warnings: Vec<Value>,
}

impl ApiRepositoryImportResponse {
    pub fn is_confirmed(&self) -> bool {
        self.uuid.is_some() && self.warnings.is_empty()
    }
}
