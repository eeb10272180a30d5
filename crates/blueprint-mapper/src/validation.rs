//! Cross-field checks on hosted customizations
//!
//! Invoked on import before any mapping or repository side effect, and on the
//! submit/edit path. New invariants are added to `CHECKS`.

use blueprint_common::Error;
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error as ThisError;
use tracing::debug;

use crate::mapper::to_request::map_customizations_from_state;
use crate::schema::hosted::Customizations;
use crate::schema::state::WizardState;

#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("disk and filesystem customizations are mutually exclusive")]
    DiskAndFilesystem,

    #[error("mountpoint '{0}' is defined more than once")]
    DuplicateMountpoint(String),
}

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::DiskAndFilesystem => {
                Error::MutuallyExclusiveCustomization(err.to_string())
            }
            ValidationError::DuplicateMountpoint(_) => Error::Validation(err.to_string()),
        }
    }
}

type Check = fn(&Customizations) -> Result<(), ValidationError>;

const CHECKS: &[Check] = &[disk_filesystem_exclusive, unique_mountpoints];

/// Run every check, reporting the first violation
pub fn validate(customizations: &Customizations) -> Result<(), ValidationError> {
    for check in CHECKS {
        if let Err(e) = check(customizations) {
            debug!("Customizations rejected: {}", e);
            return Err(e);
        }
    }
    Ok(())
}

/// Probe an unclassified document for the disk/filesystem conflict.
///
/// Runs on raw JSON so a conflicting document is rejected before any dialect
/// decision is made.
pub fn validate_raw(document: &Value) -> Result<(), ValidationError> {
    let customizations = document.get("customizations");
    let has = |key: &str| {
        customizations
            .and_then(|c| c.get(key))
            .map(|v| !v.is_null())
            .unwrap_or(false)
    };

    if has("disk") && has("filesystem") {
        return Err(ValidationError::DiskAndFilesystem);
    }
    Ok(())
}

/// Whether the state could be submitted as is
pub fn validate_state(state: &WizardState) -> Result<(), ValidationError> {
    validate(&map_customizations_from_state(state))
}

fn disk_filesystem_exclusive(customizations: &Customizations) -> Result<(), ValidationError> {
    if customizations.disk.is_some() && customizations.filesystem.is_some() {
        return Err(ValidationError::DiskAndFilesystem);
    }
    Ok(())
}

fn unique_mountpoints(customizations: &Customizations) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for fs in customizations.filesystem.iter().flatten() {
        if !seen.insert(fs.mountpoint.as_str()) {
            return Err(ValidationError::DuplicateMountpoint(fs.mountpoint.clone()));
        }
    }
    Ok(())
}
