use std::sync::Arc;

use http::Method;
use serde_json::Value;

use crate::diagnostics::Diagnostics;
use crate::features::FeatureHandlers;
use crate::middleware::steps::{
    CoercerStep, ContextTagStep, DefaultSetterStep, RequestValidationStep, ResponseValidationStep,
    SecurityStep,
};
use crate::middleware::{Handler, Middleware};

/// What a chain entry is, for introspection and tests. The chain itself is a
/// startup-time pure function of the enabled-feature set; the kind records
/// which conditional branch produced each entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    ContextTag,
    Consumer,
    Defaults,
    Coercion,
    ResponseValidation,
    RequestValidation,
    Additional,
    Security,
}

/// One assembled chain entry.
#[derive(Clone)]
pub struct Step {
    pub kind: StepKind,
    pub middleware: Arc<dyn Middleware>,
}

impl Step {
    fn new(kind: StepKind, middleware: Arc<dyn Middleware>) -> Self {
        Self { kind, middleware }
    }
}

/// Everything the adapter knows about one discovered operation when it builds
/// and registers that operation's chain.
pub struct OperationContext {
    /// The full API document
    pub document: Arc<Value>,
    /// The operation's own document fragment
    pub operation_doc: Arc<Value>,
    /// Declared path template (brace syntax)
    pub path: String,
    pub method: Method,
    /// Base paths the operation is mounted under
    pub base_paths: Vec<String>,
    /// Operation identifier; the route registration name
    pub operation_id: String,
    /// Media types the operation consumes
    pub consumes: Vec<String>,
    /// `false` when the operation opted out of optional features
    pub allows_features: bool,
    /// Pre-built feature handlers for this operation
    pub features: FeatureHandlers,
    /// Externally supplied steps, inserted verbatim
    pub additional: Vec<Arc<dyn Middleware>>,
    /// The terminal operation handler
    pub handler: Arc<dyn Handler>,
}

/// Assemble the fixed-order middleware chain for one operation.
///
/// The order is load-bearing: coercion must follow default-setting and
/// precede both validations; response validation must wrap everything
/// downstream; security runs last among the cross-cutting steps so earlier
/// steps have already normalized the view it inspects. A disabled or absent
/// feature contributes zero entries.
pub fn assemble_chain(
    ctx: &OperationContext,
    consumers: &[(String, Arc<dyn Middleware>)],
    diagnostics: &Arc<dyn Diagnostics>,
) -> Vec<Step> {
    let mut steps = Vec::new();

    steps.push(Step::new(
        StepKind::ContextTag,
        Arc::new(ContextTagStep::new(
            ctx.document.clone(),
            ctx.operation_doc.clone(),
        )),
    ));

    if ctx.allows_features {
        for (media_type, consumer) in consumers {
            if ctx.consumes.iter().any(|mt| mt == media_type) {
                steps.push(Step::new(StepKind::Consumer, consumer.clone()));
            }
        }
        if let Some(setter) = &ctx.features.default_setter {
            steps.push(Step::new(
                StepKind::Defaults,
                Arc::new(DefaultSetterStep(setter.clone())),
            ));
        }
        if let Some(coercer) = &ctx.features.coercer {
            steps.push(Step::new(
                StepKind::Coercion,
                Arc::new(CoercerStep(coercer.clone())),
            ));
        }
        if let Some(validator) = &ctx.features.response_validator {
            steps.push(Step::new(
                StepKind::ResponseValidation,
                Arc::new(ResponseValidationStep::new(
                    validator.clone(),
                    diagnostics.clone(),
                    ctx.operation_id.clone(),
                )),
            ));
        }
        if let Some(validator) = &ctx.features.request_validator {
            steps.push(Step::new(
                StepKind::RequestValidation,
                Arc::new(RequestValidationStep(validator.clone())),
            ));
        }
    }

    for mw in &ctx.additional {
        steps.push(Step::new(StepKind::Additional, mw.clone()));
    }

    if ctx.allows_features {
        if let Some(security) = &ctx.features.security {
            steps.push(Step::new(
                StepKind::Security,
                Arc::new(SecurityStep(security.clone())),
            ));
        }
    }

    steps
}
