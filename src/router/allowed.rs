use http::Method;
use serde_json::Value;

use crate::error::{join_methods, ChainError};
use crate::request::RequestContext;
use crate::response::HandlerResponse;
use crate::router::Router;

type ErrorOverride = Box<dyn Fn() -> ChainError + Send + Sync>;

/// Configuration for [`Router::allowed_methods`].
#[derive(Default)]
pub struct AllowedMethodsOptions {
    /// Return a catchable error instead of producing a status+header response
    pub throw_on_mismatch: bool,
    /// Error to return in place of the default Not-Implemented one
    pub not_implemented: Option<ErrorOverride>,
    /// Error to return in place of the default Method-Not-Allowed one
    pub method_not_allowed: Option<ErrorOverride>,
}

impl Router {
    /// Answer `OPTIONS` requests with an `Allow` header enumerating the
    /// methods registered for the matched path, and flag mismatches.
    ///
    /// A mapped path with an unmapped method yields 405 (with `Allow` listing
    /// the registered methods in registration order); a path no route matches
    /// at all yields 501. With `throw_on_mismatch`, both become `Err` instead
    /// — the defaults, unless an override supplies the error. `Ok(None)` means
    /// the request is fine; dispatch should handle it.
    pub fn allowed_methods(
        &self,
        ctx: &RequestContext,
        options: &AllowedMethodsOptions,
    ) -> Result<Option<HandlerResponse>, ChainError> {
        let allowed = self.methods_for_path(&ctx.path);

        if allowed.is_empty() {
            if options.throw_on_mismatch {
                return Err(options
                    .not_implemented
                    .as_ref()
                    .map(|f| f())
                    .unwrap_or(ChainError::NotImplemented));
            }
            return Ok(Some(HandlerResponse::new(
                501,
                Default::default(),
                Value::Null,
            )));
        }

        if ctx.method == Method::OPTIONS {
            let mut res = HandlerResponse::new(200, Default::default(), Value::Null);
            res.set_header("Allow", join_methods(&allowed));
            return Ok(Some(res));
        }

        if !allowed.contains(&ctx.method) {
            if options.throw_on_mismatch {
                return Err(options
                    .method_not_allowed
                    .as_ref()
                    .map(|f| f())
                    .unwrap_or(ChainError::MethodNotAllowed { allow: allowed }));
            }
            let mut res = HandlerResponse::new(405, Default::default(), Value::Null);
            res.set_header("Allow", join_methods(&allowed));
            return Ok(Some(res));
        }

        Ok(None)
    }
}
