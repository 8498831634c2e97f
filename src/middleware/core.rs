use std::time::Duration;

use crate::error::ChainError;
use crate::request::RequestContext;
use crate::response::HandlerResponse;

/// One step in a route's middleware chain.
///
/// `before` hooks run in chain order ahead of the operation handler; an `Err`
/// aborts the remaining chain. `after` hooks run in reverse chain order once
/// the handler and every later step have completed, so an earlier step wraps
/// everything downstream of it.
pub trait Middleware: Send + Sync {
    fn before(&self, _ctx: &mut RequestContext) -> Result<(), ChainError> {
        Ok(())
    }
    fn after(&self, _ctx: &mut RequestContext, _res: &mut HandlerResponse, _latency: Duration) {}
}

/// The terminal application-level step of a chain. Always present, always
/// last.
pub trait Handler: Send + Sync {
    fn handle(&self, ctx: &mut RequestContext) -> HandlerResponse;
}

impl<F> Handler for F
where
    F: Fn(&mut RequestContext) -> HandlerResponse + Send + Sync,
{
    fn handle(&self, ctx: &mut RequestContext) -> HandlerResponse {
        self(ctx)
    }
}
