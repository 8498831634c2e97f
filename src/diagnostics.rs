use std::sync::Arc;

use tracing::error;

/// Collaborator that receives response-validation failure reports.
///
/// A response that fails validation is never surfaced to the client; the
/// failure message goes here instead, and the client sees a bare 500. Inject a
/// custom implementation through [`RouterBuilder::diagnostics`] to forward
/// reports to an error tracker; the default logs through `tracing`.
///
/// [`RouterBuilder::diagnostics`]: crate::RouterBuilder::diagnostics
pub trait Diagnostics: Send + Sync {
    fn response_validation_failed(&self, operation: &str, status: u16, message: &str);
}

impl<T: Diagnostics + ?Sized> Diagnostics for Arc<T> {
    fn response_validation_failed(&self, operation: &str, status: u16, message: &str) {
        (**self).response_validation_failed(operation, status, message);
    }
}

/// Default sink: structured `tracing::error!` records.
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn response_validation_failed(&self, operation: &str, status: u16, message: &str) {
        error!(
            operation = %operation,
            status = status,
            message = %message,
            "Response validation failed"
        );
    }
}
