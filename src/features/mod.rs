//! Per-operation feature handlers: the cross-cutting behaviors an operation's
//! document fragment yields, built once at startup and reused for every
//! matching request.

use std::collections::HashMap;
use std::sync::Arc;

mod coerce;
mod defaults;
mod validate;

pub use coerce::{decode_param_value, Coercer};
pub use defaults::DefaultSetter;
pub use validate::{
    RequestValidator, ResponseValidationError, ResponseValidator, ValidationFailure,
};

use crate::security::{SecurityEvaluator, SecurityProvider};
use crate::spec::{OperationMeta, SecurityScheme};

/// Which optional features the adapter builds at all. Per-operation
/// applicability is decided on top of this: a toggled-on feature whose
/// operation declares nothing for it still contributes no handler.
#[derive(Debug, Clone, Copy)]
pub struct FeatureToggles {
    pub defaults: bool,
    pub coercion: bool,
    pub request_validation: bool,
    pub response_validation: bool,
    pub security: bool,
}

impl Default for FeatureToggles {
    fn default() -> Self {
        Self {
            defaults: true,
            coercion: true,
            request_validation: true,
            response_validation: true,
            security: true,
        }
    }
}

/// The bag of pre-built feature handlers for one operation. An absent handler
/// means the corresponding step is elided from the chain, not stubbed.
#[derive(Default)]
pub struct FeatureHandlers {
    pub default_setter: Option<Arc<DefaultSetter>>,
    pub coercer: Option<Arc<Coercer>>,
    pub request_validator: Option<Arc<RequestValidator>>,
    pub response_validator: Option<Arc<ResponseValidator>>,
    pub security: Option<Arc<SecurityEvaluator>>,
}

impl FeatureHandlers {
    /// Build the handlers an operation gets, honoring the global toggles and
    /// what the operation actually declares.
    ///
    /// # Errors
    ///
    /// Fails when a declared schema does not compile; surfaced at startup so a
    /// bad document never reaches dispatch.
    pub fn build(
        op: &OperationMeta,
        schemes: &HashMap<String, SecurityScheme>,
        providers: &HashMap<String, Arc<dyn SecurityProvider>>,
        toggles: FeatureToggles,
    ) -> anyhow::Result<Self> {
        let mut handlers = FeatureHandlers::default();
        if toggles.defaults {
            handlers.default_setter = DefaultSetter::new(op).map(Arc::new);
        }
        if toggles.coercion {
            handlers.coercer = Coercer::new(op).map(Arc::new);
        }
        if toggles.request_validation {
            handlers.request_validator = RequestValidator::new(op)?.map(Arc::new);
        }
        if toggles.response_validation {
            handlers.response_validator = ResponseValidator::new(op)?.map(Arc::new);
        }
        if toggles.security && !op.security.is_empty() {
            handlers.security = Some(Arc::new(SecurityEvaluator::new(
                op.security.clone(),
                schemes.clone(),
                providers.clone(),
            )));
        }
        Ok(handlers)
    }
}
