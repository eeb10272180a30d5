//! Engine entry point
//!
//! `BlueprintEngine` is built once with its configuration and collaborators
//! and then serves every import, submit, edit and export operation.

use blueprint_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

use crate::export::{export_blueprint, ExportFile};
use crate::import::{parse_document, Dialect, ParsedDocument};
use crate::mapper::{
    map_export_to_state, map_onprem_to_hosted, map_request_from_state, map_request_to_state,
    SubmitContext,
};
use crate::reconcile::{collect_descriptors, reconcile, ImportWarning, RepositoryImporter};
use crate::schema::hosted::{BlueprintResponse, CreateBlueprintRequest, Customizations};
use crate::schema::state::WizardState;
use crate::validation;

/// Which image-builder deployment the engine serves
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    #[default]
    Hosted,
    OnPrem,
}

impl FromStr for Backend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hosted" => Ok(Backend::Hosted),
            "on-prem" | "onprem" => Ok(Backend::OnPrem),
            other => Err(Error::Validation(format!("unknown backend '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub backend: Backend,

    /// Register referenced repositories on import
    pub import_repositories: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Hosted,
            import_repositories: true,
        }
    }
}

/// Result of importing a file, ready to seed the wizard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportPreview {
    pub state: WizardState,
    pub dialect: Dialect,

    /// The document was translated from the on-prem dialect
    pub is_on_prem: bool,

    pub warnings: Vec<ImportWarning>,

    /// URLs of repositories the collaborator confirmed
    pub imported_repositories: Vec<String>,
}

pub struct BlueprintEngine {
    config: EngineConfig,
    importer: Arc<dyn RepositoryImporter>,
}

impl BlueprintEngine {
    pub fn new(config: EngineConfig, importer: Arc<dyn RepositoryImporter>) -> Self {
        Self { config, importer }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn reconciles_repositories(&self) -> bool {
        self.config.backend == Backend::Hosted && self.config.import_repositories
    }

    /// Import a blueprint file.
    ///
    /// Every terminal rejection happens before the repository collaborator is
    /// called. Repository failures are reported as warnings.
    pub async fn import(&self, content: &str, filename: &str) -> Result<ImportPreview> {
        info!("Importing blueprint file '{}'", filename);

        let parsed = parse_document(content, filename)?;
        let dialect = parsed.dialect();
        let mut export = match parsed {
            ParsedDocument::Hosted(export) => export,
            ParsedDocument::OnPrem(blueprint) => map_onprem_to_hosted(&blueprint),
        };

        // TOML never passes the raw probe, so the gate runs again here
        validation::validate(&export.customizations)?;

        let is_on_prem = export
            .metadata
            .as_ref()
            .and_then(|m| m.is_on_prem)
            .unwrap_or(false);

        let mut warnings = Vec::new();
        let mut imported_repositories = Vec::new();

        if self.reconciles_repositories() {
            let requests = collect_descriptors(&export);
            if !requests.is_empty() {
                let outcome = reconcile(self.importer.as_ref(), requests).await;
                warnings = outcome.warnings();
                imported_repositories = outcome.imported_urls;

                let confirmed = outcome.confirmed;
                export.customizations.custom_repositories =
                    Some(confirmed).filter(|repos| !repos.is_empty());
                export.customizations.payload_repositories = None;
            }
        } else {
            debug!("Repository import disabled for this engine");
        }

        let state = map_export_to_state(&export)?;
        info!(
            "Imported blueprint '{}' ({:?}, {} warnings)",
            state.name,
            dialect,
            warnings.len()
        );

        Ok(ImportPreview {
            state,
            dialect,
            is_on_prem,
            warnings,
            imported_repositories,
        })
    }

    /// Create/update request for the submit path
    pub fn build_request(
        &self,
        state: &WizardState,
        context: &SubmitContext,
    ) -> Result<CreateBlueprintRequest> {
        map_request_from_state(state, context)
    }

    /// Wizard state for editing an existing blueprint
    pub fn to_state(&self, blueprint: &BlueprintResponse) -> Result<WizardState> {
        map_request_to_state(blueprint)
    }

    pub fn validate(&self, customizations: &Customizations) -> Result<()> {
        Ok(validation::validate(customizations)?)
    }

    pub fn validate_state(&self, state: &WizardState) -> Result<()> {
        Ok(validation::validate_state(state)?)
    }

    pub fn export(&self, state: &WizardState, parent_id: Option<&str>) -> Result<ExportFile> {
        export_blueprint(state, parent_id)
    }
}
