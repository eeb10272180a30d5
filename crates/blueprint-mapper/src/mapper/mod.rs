//! Document mappers
//!
//! - `onprem`: on-prem dialect to hosted export document
//! - `to_request`: wizard state to hosted create/update request (submit path)
//! - `to_state`: hosted response or export to wizard state (edit/import path)
//! - `first_boot`: the first-boot script file encoding shared by both directions

pub mod first_boot;
pub mod onprem;
pub mod to_request;
pub mod to_state;

pub use onprem::map_onprem_to_hosted;
pub use to_request::{map_request_from_state, map_subscription, SubmitContext};
pub use to_state::{map_export_to_state, map_request_to_state};
