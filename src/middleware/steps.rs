use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::diagnostics::Diagnostics;
use crate::error::ChainError;
use crate::features::{Coercer, DefaultSetter, RequestValidator, ResponseValidator};
use crate::middleware::Middleware;
use crate::request::{OpenApiContext, RequestContext};
use crate::response::HandlerResponse;
use crate::security::{SecurityEvaluator, SecurityRequest};

/// Attaches the API document and the operation's fragment to the request
/// state. Unconditional first step of every chain.
pub struct ContextTagStep {
    document: Arc<Value>,
    operation: Arc<Value>,
}

impl ContextTagStep {
    pub fn new(document: Arc<Value>, operation: Arc<Value>) -> Self {
        Self {
            document,
            operation,
        }
    }
}

impl Middleware for ContextTagStep {
    fn before(&self, ctx: &mut RequestContext) -> Result<(), ChainError> {
        ctx.openapi = Some(OpenApiContext {
            document: self.document.clone(),
            operation: self.operation.clone(),
        });
        Ok(())
    }
}

/// Applies schema defaults to the request view.
pub struct DefaultSetterStep(pub Arc<DefaultSetter>);

impl Middleware for DefaultSetterStep {
    fn before(&self, ctx: &mut RequestContext) -> Result<(), ChainError> {
        self.0.apply(&mut ctx.request);
        Ok(())
    }
}

/// Retypes string path/query parameters per their schemas.
pub struct CoercerStep(pub Arc<Coercer>);

impl Middleware for CoercerStep {
    fn before(&self, ctx: &mut RequestContext) -> Result<(), ChainError> {
        self.0.coerce(&mut ctx.request);
        Ok(())
    }
}

/// Aborts the chain when the request view fails validation; the operation
/// handler never runs.
pub struct RequestValidationStep(pub Arc<RequestValidator>);

impl Middleware for RequestValidationStep {
    fn before(&self, ctx: &mut RequestContext) -> Result<(), ChainError> {
        if let Some(failure) = self.0.validate(&ctx.request) {
            return Err(ChainError::Validation {
                status: failure.status,
                errors: failure.errors,
            });
        }
        Ok(())
    }
}

/// Wraps everything downstream: once the handler has produced its response,
/// validates it and — on failure — reports to diagnostics and replaces the
/// outgoing response with a bare 500, whatever the handler had set.
pub struct ResponseValidationStep {
    validator: Arc<ResponseValidator>,
    diagnostics: Arc<dyn Diagnostics>,
    operation_id: String,
}

impl ResponseValidationStep {
    pub fn new(
        validator: Arc<ResponseValidator>,
        diagnostics: Arc<dyn Diagnostics>,
        operation_id: String,
    ) -> Self {
        Self {
            validator,
            diagnostics,
            operation_id,
        }
    }
}

impl Middleware for ResponseValidationStep {
    fn after(&self, _ctx: &mut RequestContext, res: &mut HandlerResponse, _latency: Duration) {
        if let Some(err) = self.validator.validate_response(res.status, &res.body) {
            self.diagnostics
                .response_validation_failed(&self.operation_id, res.status, &err.message);
            res.status = 500;
            res.body = Value::Null;
        }
    }
}

/// Evaluates the operation's security requirements; rejection aborts the
/// chain and propagates unwrapped.
pub struct SecurityStep(pub Arc<SecurityEvaluator>);

impl Middleware for SecurityStep {
    fn before(&self, ctx: &mut RequestContext) -> Result<(), ChainError> {
        let credentials = SecurityRequest {
            headers: &ctx.request.headers,
            query: &ctx.request.query,
            cookies: &ctx.cookies,
        };
        self.0.evaluate(&credentials)
    }
}
