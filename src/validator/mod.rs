//! # Schema Validator
//!
//! Validates JSON request bodies against a body model and the rules registered
//! for it. The failure message sent to clients is built by [`ValidationReport`]:
//!
//! ```text
//! Model Validation Error(s):
//! Missing parameters in request: <missing, comma separated>
//! Invalid parameters in request: <invalid, comma separated>
//! ```
//!
//! A section with no entries is left out.
//!
//! Payload keys that the model does not name are ignored, as are nested model
//! rules: rules only apply to the top-level fields of the endpoint's model, while
//! nested models contribute their `Optional` markers to the shape walk.

mod core;
mod model;
mod report;

pub use core::{validate, validate_body, INCOMPATIBLE_BODY, JSON_CONTENT_TYPE_REQUIRED};
pub use model::{BodySchema, ModelRef};
pub use report::{ValidationReport, INVALID_LABEL, MISSING_LABEL, REPORT_HEADER};
