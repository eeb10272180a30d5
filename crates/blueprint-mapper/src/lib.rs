//! Blueprint Mapper
//!
//! Translates image blueprints between the hosted wire dialect, the on-prem
//! dialect and the normalized wizard state. Imports are parsed, classified,
//! validated and have their repositories reconciled before they reach the
//! wizard; submits and edits map wizard state to and from hosted requests.

pub mod engine;
pub mod export;
pub mod import;
pub mod mapper;
pub mod reconcile;
pub mod schema;
pub mod validation;

pub use engine::{Backend, BlueprintEngine, EngineConfig, ImportPreview};
pub use export::{export_blueprint, sanitize_filename, ExportFile};
pub use import::{classify, parse_document, Classified, Dialect, ParsedDocument};
pub use mapper::{
    map_export_to_state, map_onprem_to_hosted, map_request_from_state, map_request_to_state,
    SubmitContext,
};
pub use reconcile::{
    collect_descriptors, reconcile, ImportWarning, Reconciliation, RepositoryFailure,
    RepositoryImporter,
};
pub use schema::*;
pub use validation::{validate, validate_raw, validate_state, ValidationError};
