use std::sync::Arc;
use std::time::Instant;

use http::Method;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::ChainError;
use crate::middleware::{Handler, Step};
use crate::request::{ParamVec, RequestContext};
use crate::response::HandlerResponse;

/// One registered route: a method, a translated path in `:name` syntax, the
/// assembled middleware chain, and the terminal handler, tagged with the
/// operation identifier for reverse lookup.
pub struct Route {
    pub method: Method,
    pub path: String,
    /// Operation identifier this route was registered under
    pub name: String,
    pub steps: Vec<Step>,
    pub handler: Arc<dyn Handler>,
    pub(crate) regex: Regex,
    pub(crate) param_names: Vec<Arc<str>>,
}

/// The route table plus the dispatch entry point.
///
/// Built once during initialization and never mutated afterwards; dispatch
/// reads it immutably, so the router can be shared freely across threads.
#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.routes.len())
            .finish()
    }
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route. `path` uses the router's `:name` parameter syntax;
    /// `name` is the operation identifier used for reverse lookup.
    pub fn register(
        &mut self,
        method: Method,
        path: impl Into<String>,
        steps: Vec<Step>,
        handler: Arc<dyn Handler>,
        name: impl Into<String>,
    ) {
        let path = path.into();
        let name = name.into();
        let (regex, param_names) = path_to_regex(&path);
        info!(
            method = %method,
            path = %path,
            operation = %name,
            steps = steps.len(),
            "Route registered"
        );
        self.routes.push(Route {
            method,
            path,
            name,
            steps,
            handler,
            regex,
            param_names,
        });
    }

    /// Registered routes, in registration order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Reverse lookup by operation identifier.
    pub fn route_by_name(&self, name: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.name == name)
    }

    /// Match an incoming request to a registered route and execute its
    /// middleware sequence in order.
    ///
    /// `Ok(None)` means no route matched: the request falls through to
    /// whatever the embedding server does next. `Err` is a chain abort (see
    /// [`ChainError`]) raised by one of the `before` steps; the operation
    /// handler has not run.
    pub fn dispatch(
        &self,
        ctx: &mut RequestContext,
    ) -> Result<Option<HandlerResponse>, ChainError> {
        debug!(method = %ctx.method, path = %ctx.path, "Route match attempt");
        let Some((route, params)) = self.match_route(&ctx.method, &ctx.path) else {
            warn!(method = %ctx.method, path = %ctx.path, "No route matched");
            return Ok(None);
        };
        info!(
            method = %ctx.method,
            path = %ctx.path,
            route_pattern = %route.path,
            operation = %route.name,
            "Route matched"
        );
        ctx.request.params = params;

        for step in &route.steps {
            step.middleware.before(ctx)?;
        }

        let start = Instant::now();
        let mut res = route.handler.handle(ctx);
        let latency = start.elapsed();

        // Reverse order: the earliest registered wrapper sees the final
        // response last.
        for step in route.steps.iter().rev() {
            step.middleware.after(ctx, &mut res, latency);
        }
        Ok(Some(res))
    }

    /// Methods registered for any route whose path matches, in registration
    /// order, deduplicated.
    pub(crate) fn methods_for_path(&self, path: &str) -> Vec<Method> {
        let mut out: Vec<Method> = Vec::new();
        for route in &self.routes {
            if route.regex.is_match(path) && !out.contains(&route.method) {
                out.push(route.method.clone());
            }
        }
        out
    }

    fn match_route(&self, method: &Method, path: &str) -> Option<(&Route, ParamVec)> {
        for route in &self.routes {
            if &route.method != method {
                continue;
            }
            if let Some(caps) = route.regex.captures(path) {
                let mut params = ParamVec::new();
                for (i, name) in route.param_names.iter().enumerate() {
                    if let Some(m) = caps.get(i + 1) {
                        params.push((name.clone(), Value::String(m.as_str().to_string())));
                    }
                }
                return Some((route, params));
            }
        }
        None
    }
}

/// Compile a `:name` path into a matching regex and the ordered parameter
/// names. Literal segments are regex-escaped.
pub(crate) fn path_to_regex(path: &str) -> (Regex, Vec<Arc<str>>) {
    if path == "/" {
        return (
            Regex::new(r"^/$").expect("failed to compile path regex"),
            Vec::new(),
        );
    }

    let mut pattern = String::with_capacity(path.len() + 8);
    pattern.push('^');
    let mut param_names: Vec<Arc<str>> = Vec::new();

    for segment in path.split('/') {
        if let Some(name) = segment.strip_prefix(':') {
            pattern.push_str("/([^/]+)");
            param_names.push(Arc::from(name));
        } else if !segment.is_empty() {
            pattern.push('/');
            pattern.push_str(&regex::escape(segment));
        }
    }

    pattern.push('$');
    let regex = Regex::new(&pattern).expect("failed to compile path regex");
    (regex, param_names)
}
