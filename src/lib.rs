//! # specrouter
//!
//! An OpenAPI 3.x driven middleware-chain router. The API document is the
//! single source of truth: for every operation it declares, the builder
//! assembles a fixed-order chain of cross-cutting steps — context tagging,
//! body consumers, schema defaults, type coercion, response validation,
//! request validation, externally supplied steps, security — around the
//! registered operation handler, and registers one route per base path.
//!
//! ## Architecture
//!
//! - **[`spec`]** — document loading and operation discovery (built on `oas3`)
//! - **[`features`]** — the per-operation cross-cutting handlers; schema
//!   validators compile once at startup (`jsonschema`)
//! - **[`middleware`]** — the `Middleware` trait, the fixed steps, and chain
//!   assembly
//! - **[`router`]** — path translation (`{id}` → `:id`), matching, dispatch,
//!   and the allowed-methods responder
//! - **[`security`]** — the `SecurityProvider` trait and shipped providers
//!
//! The crate is transport-agnostic: an embedding server parses the HTTP
//! request into a [`RequestContext`], calls [`Router::dispatch`], and writes
//! out the returned [`HandlerResponse`] (or the [`ChainError`] it maps to).
//!
//! ## Example
//!
//! ```no_run
//! use serde_json::json;
//! use specrouter::{HandlerResponse, RequestContext, RouterBuilder};
//!
//! # fn main() -> anyhow::Result<()> {
//! let router = RouterBuilder::new()
//!     .api_path("openapi.yaml")
//!     .operation("list_widgets", |_ctx: &mut RequestContext| {
//!         HandlerResponse::json(200, json!([{ "id": 1 }]))
//!     })
//!     .build()?;
//!
//! let mut ctx = RequestContext::new(http::Method::GET, "/widgets?limit=10");
//! match router.dispatch(&mut ctx) {
//!     Ok(Some(res)) => println!("{} {}", res.status, res.body),
//!     Ok(None) => println!("no route matched"),
//!     Err(abort) => println!("{} {}", abort.status(), abort),
//! }
//! # Ok(())
//! # }
//! ```

mod builder;
pub mod diagnostics;
mod error;
pub mod features;
pub mod middleware;
pub mod request;
mod response;
pub mod router;
pub mod security;
pub mod spec;

pub use builder::RouterBuilder;
pub use diagnostics::{Diagnostics, TracingDiagnostics};
pub use error::ChainError;
pub use features::FeatureToggles;
pub use middleware::{Handler, Middleware, Step, StepKind};
pub use request::{OpenApiRequest, RequestContext};
pub use response::HandlerResponse;
pub use router::{translate_path, AllowedMethodsOptions, Router};
pub use security::{ApiKeyProvider, BearerJwtProvider, SecurityProvider, SecurityRequest};
pub use spec::{load_document, load_document_value, OperationMeta};
