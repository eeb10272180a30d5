//! Blueprint export file

use blueprint_common::Result;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::mapper::to_request::map_customizations_from_state;
use crate::reconcile::collect_descriptors;
use crate::schema::hosted::{BlueprintExport, Metadata};
use crate::schema::state::WizardState;
use crate::validation;

/// A downloadable blueprint document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportFile {
    pub filename: String,
    pub content: String,
}

/// Render `state` as a pretty-printed hosted-dialect JSON file.
///
/// Custom repositories are also listed as `content_sources` so that importing
/// the file elsewhere can register them.
pub fn export_blueprint(state: &WizardState, parent_id: Option<&str>) -> Result<ExportFile> {
    let customizations = map_customizations_from_state(state);
    validation::validate(&customizations)?;

    let mut export = BlueprintExport {
        name: state.name.clone(),
        description: Some(state.description.clone()).filter(|d| !d.is_empty()),
        distribution: Some(state.distribution.clone()).filter(|d| !d.is_empty()),
        customizations,
        metadata: Some(Metadata {
            parent_id: parent_id.map(str::to_string),
            exported_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            is_on_prem: None,
        }),
        content_sources: None,
        snapshot_date: state.snapshot_date.clone(),
    };
    let sources = collect_descriptors(&export);
    if !sources.is_empty() {
        export.content_sources = Some(sources);
    }

    let content = serde_json::to_string_pretty(&export)?;
    let filename = format!("{}.json", sanitize_filename(&state.name));
    info!("Exported blueprint '{}' as {}", state.name, filename);

    Ok(ExportFile { filename, content })
}

/// Lowercase `name` and replace each whitespace run, leading and trailing
/// runs included, with a single `_`
pub fn sanitize_filename(name: &str) -> String {
    if name.is_empty() {
        return "blueprint".to_string();
    }

    let mut sanitized = String::with_capacity(name.len());
    let mut in_run = false;
    for c in name.chars() {
        if c.is_whitespace() {
            if !in_run {
                sanitized.push('_');
            }
            in_run = true;
        } else {
            sanitized.extend(c.to_lowercase());
            in_run = false;
        }
    }
    sanitized
}
