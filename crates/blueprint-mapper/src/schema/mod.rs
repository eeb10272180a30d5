//! Schema definitions
//!
//! The three document shapes the engine translates between, as plain data:
//! the hosted wire dialect, the on-prem dialect, and the normalized wizard
//! state. Repository import records live alongside them.

pub mod hosted;
pub mod onprem;
pub mod repositories;
pub mod state;

pub use hosted::{BlueprintExport, BlueprintResponse, CreateBlueprintRequest, Customizations};
pub use onprem::OnPremBlueprint;
pub use repositories::{ApiRepositoryImportResponse, ApiRepositoryRequest};
pub use state::{ImageType, WizardState};
