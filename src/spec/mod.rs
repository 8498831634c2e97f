//! OpenAPI document loading and operation discovery.
//!
//! Parsing proper is delegated to the `oas3` crate; this module sanitizes the
//! raw document, walks it, and flattens each declared (path, method) pair into
//! an [`OperationMeta`] with schemas resolved — the unit the rest of the crate
//! builds feature handlers and middleware chains from.

mod build;
mod load;
mod types;

pub use build::*;
pub use load::*;
pub use types::*;

pub use oas3::spec::{SecurityRequirement, SecurityScheme};
pub use oas3::OpenApiV3Spec;
