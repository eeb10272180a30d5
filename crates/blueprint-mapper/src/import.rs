//! Import parser and dialect detector
//!
//! Turns an uploaded file into either a hosted export document or an on-prem
//! blueprint. TOML is always on-prem. JSON goes through a two-pass classifier:
//! a structural marker check decides whether the on-prem or the hosted pass
//! runs first, and the other pass is the fallback.

use blueprint_common::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::schema::hosted::BlueprintExport;
use crate::schema::onprem::OnPremBlueprint;
use crate::validation::validate_raw;

/// Largest accepted import file, in bytes
pub const MAX_IMPORT_SIZE: usize = 512_000;

const ONPREM_TOP_LEVEL_MARKERS: &[&str] = &["packages", "containers", "distro", "version"];
const ONPREM_CUSTOMIZATION_MARKERS: &[&str] = &["user", "sshkey", "ssh_key", "repositories", "group"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dialect {
    Hosted,
    OnPrem,
}

/// Outcome of classifying a parsed JSON document
#[derive(Debug, Clone, PartialEq)]
pub enum Classified {
    Hosted(BlueprintExport),
    OnPrem(OnPremBlueprint),
    Unknown {
        hosted_error: String,
        onprem_error: String,
    },
}

/// A successfully parsed import file, not yet mapped or validated
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedDocument {
    Hosted(BlueprintExport),
    OnPrem(OnPremBlueprint),
}

impl ParsedDocument {
    pub fn dialect(&self) -> Dialect {
        match self {
            ParsedDocument::Hosted(_) => Dialect::Hosted,
            ParsedDocument::OnPrem(_) => Dialect::OnPrem,
        }
    }
}

/// Parse an import file
///
/// # Arguments
/// * `content` - Raw file content
/// * `filename` - Original file name; its extension selects the parser
///
/// # Returns
/// * The document in whichever dialect it was recognized as
pub fn parse_document(content: &str, filename: &str) -> Result<ParsedDocument> {
    if content.len() > MAX_IMPORT_SIZE {
        return Err(Error::MalformedDocument(format!(
            "file is {} bytes, the limit is {}",
            content.len(),
            MAX_IMPORT_SIZE
        )));
    }

    match extension(filename).as_deref() {
        Some("toml") => parse_toml(content),
        Some("json") => parse_json(content),
        _ => Err(Error::MalformedDocument(format!(
            "'{}' is neither a .toml nor a .json file",
            filename
        ))),
    }
}

fn extension(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
}

fn parse_toml(content: &str) -> Result<ParsedDocument> {
    let blueprint: OnPremBlueprint = toml::from_str(content)
        .map_err(|e| Error::MalformedDocument(format!("invalid TOML: {}", e)))?;
    info!("Parsed TOML import '{}' as on-prem blueprint", blueprint.name);
    Ok(ParsedDocument::OnPrem(blueprint))
}

fn parse_json(content: &str) -> Result<ParsedDocument> {
    let document: Value = serde_json::from_str(content)
        .map_err(|e| Error::MalformedDocument(format!("invalid JSON: {}", e)))?;

    if !document.is_object() {
        return Err(Error::UnrecognizedDialect(
            "the document is not a JSON object".to_string(),
        ));
    }

    // Rejected before any dialect decision
    validate_raw(&document)?;

    match classify(&document) {
        Classified::Hosted(export) => {
            info!("Classified JSON import '{}' as hosted", export.name);
            Ok(ParsedDocument::Hosted(export))
        }
        Classified::OnPrem(blueprint) => {
            info!("Classified JSON import '{}' as on-prem", blueprint.name);
            Ok(ParsedDocument::OnPrem(blueprint))
        }
        Classified::Unknown {
            hosted_error,
            onprem_error,
        } => Err(Error::UnrecognizedDialect(format!(
            "hosted: {}; on-prem: {}",
            hosted_error, onprem_error
        ))),
    }
}

/// Two-pass dialect classifier
///
/// On-prem markers only decide which pass runs first. `Unknown` carries the
/// errors of both passes.
pub fn classify(document: &Value) -> Classified {
    if has_onprem_markers(document) {
        debug!("On-prem markers present, trying on-prem pass first");
        let onprem_error = match OnPremBlueprint::deserialize(document) {
            Ok(blueprint) => return Classified::OnPrem(blueprint),
            Err(e) => e.to_string(),
        };
        debug!("On-prem pass failed: {}", onprem_error);
        match BlueprintExport::deserialize(document) {
            Ok(export) => Classified::Hosted(export),
            Err(e) => Classified::Unknown {
                hosted_error: e.to_string(),
                onprem_error,
            },
        }
    } else {
        let hosted_error = match BlueprintExport::deserialize(document) {
            Ok(export) => return Classified::Hosted(export),
            Err(e) => e.to_string(),
        };
        debug!("Hosted pass failed: {}", hosted_error);
        match OnPremBlueprint::deserialize(document) {
            Ok(blueprint) => Classified::OnPrem(blueprint),
            Err(e) => Classified::Unknown {
                hosted_error,
                onprem_error: e.to_string(),
            },
        }
    }
}

/// Keys only the on-prem dialect uses
pub fn has_onprem_markers(document: &Value) -> bool {
    if ONPREM_TOP_LEVEL_MARKERS
        .iter()
        .any(|key| document.get(key).is_some())
    {
        return true;
    }

    let Some(customizations) = document.get("customizations") else {
        return false;
    };
    ONPREM_CUSTOMIZATION_MARKERS
        .iter()
        .any(|key| customizations.get(key).is_some())
        || customizations.get("fips").map(Value::is_boolean).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_oversize_is_malformed() {
        let content = " ".repeat(MAX_IMPORT_SIZE + 1);
        assert!(matches!(
            parse_document(&content, "big.json"),
            Err(Error::MalformedDocument(_))
        ));
    }

    #[test]
    fn test_unsupported_extension() {
        assert!(matches!(
            parse_document("{}", "blueprint.yaml"),
            Err(Error::MalformedDocument(_))
        ));
        assert!(matches!(
            parse_document("{}", "no-extension"),
            Err(Error::MalformedDocument(_))
        ));
    }

    #[test]
    fn test_extension_is_case_insensitive() {
        let parsed = parse_document("name = \"x\"\n", "Blueprint.TOML").unwrap();
        assert_eq!(parsed.dialect(), Dialect::OnPrem);
    }

    #[test]
    fn test_toml_disk_minsize_as_bytes_or_text() {
        use crate::schema::hosted::DiskSize;

        let content = "name = \"d\"\n[customizations.disk]\nminsize = 10737418240\n";
        let parsed = parse_document(content, "d.toml").unwrap();
        let ParsedDocument::OnPrem(blueprint) = parsed else {
            panic!("expected on-prem");
        };
        assert_eq!(
            blueprint.customizations.unwrap().disk.unwrap().minsize,
            Some(DiskSize::Bytes(10_737_418_240))
        );

        let content = "name = \"d\"\n[customizations.disk]\nminsize = \"10 GiB\"\n";
        let parsed = parse_document(content, "d.toml").unwrap();
        let ParsedDocument::OnPrem(blueprint) = parsed else {
            panic!("expected on-prem");
        };
        assert_eq!(
            blueprint.customizations.unwrap().disk.unwrap().minsize,
            Some(DiskSize::Text("10 GiB".to_string()))
        );
    }

    #[test]
    fn test_malformed_json_and_toml() {
        assert!(matches!(
            parse_document("{\"name\": ", "a.json"),
            Err(Error::MalformedDocument(_))
        ));
        assert!(matches!(
            parse_document("name = ", "a.toml"),
            Err(Error::MalformedDocument(_))
        ));
    }

    #[test]
    fn test_non_object_json() {
        assert!(matches!(
            parse_document("[1, 2]", "a.json"),
            Err(Error::UnrecognizedDialect(_))
        ));
    }

    #[test]
    fn test_disk_and_filesystem_rejected_before_classification() {
        let content = json!({
            "name": "conflict",
            "customizations": {
                "disk": {"partitions": []},
                "filesystem": [{"mountpoint": "/", "min_size": 1}]
            }
        })
        .to_string();
        assert!(matches!(
            parse_document(&content, "conflict.json"),
            Err(Error::MutuallyExclusiveCustomization(_))
        ));
    }

    #[test]
    fn test_hosted_json() {
        let document = json!({
            "name": "hosted",
            "distribution": "rhel-9",
            "customizations": {
                "users": [{"name": "ops"}],
                "groups": [{"name": "admins"}],
                "fips": {"enabled": true}
            }
        });
        match classify(&document) {
            Classified::Hosted(export) => {
                assert_eq!(export.name, "hosted");
                assert_eq!(export.customizations.groups.unwrap()[0].name, "admins");
            }
            other => panic!("expected hosted, got {:?}", other),
        }
    }

    #[test]
    fn test_onprem_markers_skip_hosted_pass() {
        let document = json!({
            "name": "onprem",
            "packages": [{"name": "vim"}],
            "customizations": {"user": [{"name": "ops", "key": "ssh-rsa A"}]}
        });
        assert!(has_onprem_markers(&document));
        assert!(matches!(classify(&document), Classified::OnPrem(_)));
    }

    #[test]
    fn test_saved_hosted_blueprint_with_version() {
        let content = json!({
            "id": "bp-1",
            "name": "saved",
            "version": 2,
            "distribution": "rhel-9",
            "image_requests": [],
            "customizations": {"packages": ["vim"]}
        })
        .to_string();
        assert!(has_onprem_markers(&serde_json::from_str(&content).unwrap()));

        match parse_document(&content, "saved.json").unwrap() {
            ParsedDocument::Hosted(export) => {
                assert_eq!(export.name, "saved");
                assert_eq!(export.customizations.packages.unwrap(), vec!["vim"]);
            }
            other => panic!("expected hosted, got {:?}", other),
        }
    }

    #[test]
    fn test_marked_document_failing_both_passes() {
        let document = json!({"packages": [{"name": "vim"}]});
        match classify(&document) {
            Classified::Unknown {
                hosted_error,
                onprem_error,
            } => {
                assert!(hosted_error.contains("name"));
                assert!(onprem_error.contains("name"));
            }
            other => panic!("expected unknown, got {:?}", other),
        }
    }

    #[test]
    fn test_boolean_fips_is_a_marker() {
        assert!(has_onprem_markers(&json!({"customizations": {"fips": true}})));
        assert!(!has_onprem_markers(
            &json!({"customizations": {"fips": {"enabled": true}}})
        ));
    }

    #[test]
    fn test_fallback_to_onprem() {
        // Hosted filesystem requires min_size; the on-prem shape uses minsize
        let document = json!({
            "name": "fallback",
            "customizations": {"filesystem": [{"mountpoint": "/var", "minsize": "2 GiB"}]}
        });
        assert!(!has_onprem_markers(&document));
        match classify(&document) {
            Classified::OnPrem(bp) => {
                let fs = &bp.customizations.unwrap().filesystem.unwrap()[0];
                assert_eq!(fs.minsize, 2 * 1024 * 1024 * 1024);
            }
            other => panic!("expected on-prem, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_dialect() {
        let content = json!({"description": "no name"}).to_string();
        match parse_document(&content, "unknown.json") {
            Err(Error::UnrecognizedDialect(detail)) => {
                assert!(detail.contains("hosted"));
                assert!(detail.contains("on-prem"));
            }
            other => panic!("expected unrecognized dialect, got {:?}", other),
        }
    }
}
