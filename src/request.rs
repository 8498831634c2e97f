//! Per-request state and the framework-agnostic request view.
//!
//! [`RequestContext`] is what an embedding server hands to
//! [`Router::dispatch`](crate::Router::dispatch): method, path, the normalized
//! [`OpenApiRequest`] view (body, headers, path params, query params), cookies,
//! and the per-request state the context-tagging step fills in. Parameter
//! values are JSON values rather than strings so the coercer can retype them
//! in place before validation runs.

use std::sync::Arc;

use http::Method;
use serde_json::Value;
use smallvec::SmallVec;

/// Maximum number of path/query parameters held inline before heap allocation.
/// Most REST APIs have only a few path params per route.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage. Names come from the route table built at
/// startup, so they are shared `Arc<str>`; values are per-request JSON values.
pub type ParamVec = SmallVec<[(Arc<str>, Value); MAX_INLINE_PARAMS]>;

/// Maximum number of headers/cookies held inline before heap allocation.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header/cookie storage.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// The normalized request view handed to every feature handler: body, headers,
/// path parameters, query parameters. Read directly off the context — never
/// cached — and mutated in place by the default setter and the coercer.
#[derive(Debug, Clone, Default)]
pub struct OpenApiRequest {
    /// Request body parsed as JSON, if present
    pub body: Option<Value>,
    /// HTTP headers (lowercase names)
    pub headers: HeaderVec,
    /// Path parameters extracted from the matched route template
    pub params: ParamVec,
    /// Query string parameters
    pub query: ParamVec,
}

impl OpenApiRequest {
    /// Get a header by name (case-insensitive per RFC 7230).
    #[inline]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Get a path parameter by name.
    ///
    /// Uses "last write wins" semantics when duplicate names exist at
    /// different path depths.
    #[inline]
    pub fn get_param(&self, name: &str) -> Option<&Value> {
        self.params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v)
    }

    /// Get a query parameter by name (last write wins for duplicates).
    #[inline]
    pub fn get_query(&self, name: &str) -> Option<&Value> {
        self.query
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v)
    }
}

/// The API document and operation fragment tagged onto a request by the
/// context-tagging step, so downstream steps and the operation handler can
/// introspect the spec without re-parsing it.
#[derive(Debug, Clone)]
pub struct OpenApiContext {
    /// The full API document
    pub document: Arc<Value>,
    /// This operation's fragment of the document
    pub operation: Arc<Value>,
}

/// Everything the adapter knows about one in-flight request.
///
/// All state is local to the request; nothing here is shared across
/// concurrent dispatches.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// HTTP method
    pub method: Method,
    /// Request path with any query string already split off
    pub path: String,
    /// The normalized request view (body, headers, params, query)
    pub request: OpenApiRequest,
    /// Cookies parsed from the `Cookie` header
    pub cookies: HeaderVec,
    /// Set by the context-tagging step once a route matches
    pub openapi: Option<OpenApiContext>,
}

impl RequestContext {
    /// Build a context from a method and a path.
    ///
    /// A query string in `path` is split off and parsed into the query view,
    /// the way an embedding server would before calling dispatch.
    pub fn new(method: Method, path: &str) -> Self {
        let query = parse_query_params(path);
        let bare = path.split('?').next().unwrap_or("/").to_string();
        Self {
            method,
            path: bare,
            request: OpenApiRequest {
                query,
                ..Default::default()
            },
            cookies: HeaderVec::new(),
            openapi: None,
        }
    }

    /// Attach a JSON body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.request.body = Some(body);
        self
    }

    /// Attach a header (name is lowercased).
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.request
            .headers
            .push((Arc::from(name.to_ascii_lowercase().as_str()), value.into()));
        self
    }

    /// Attach a cookie.
    pub fn with_cookie(mut self, name: &str, value: impl Into<String>) -> Self {
        self.cookies.push((Arc::from(name), value.into()));
        self
    }
}

/// Parse query string parameters from a URL path.
///
/// Extracts everything after the `?` and URL-decodes names and values. Values
/// enter the view as JSON strings; the coercer retypes them later if enabled.
pub fn parse_query_params(path: &str) -> ParamVec {
    let mut out = ParamVec::new();
    if let Some(pos) = path.find('?') {
        let query_str = &path[pos + 1..];
        for (k, v) in url::form_urlencoded::parse(query_str.as_bytes()) {
            out.push((Arc::from(k.as_ref()), Value::String(v.to_string())));
        }
    }
    out
}

/// Parse the `Cookie` header out of a header collection.
pub fn parse_cookies(headers: &HeaderVec) -> HeaderVec {
    let mut out = HeaderVec::new();
    let raw = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("cookie"))
        .map(|(_, v)| v.as_str());
    if let Some(raw) = raw {
        for pair in raw.split(';') {
            let mut parts = pair.trim().splitn(2, '=');
            if let Some(name) = parts.next() {
                if name.is_empty() {
                    continue;
                }
                let value = parts.next().unwrap_or("").trim().to_string();
                out.push((Arc::from(name.trim()), value));
            }
        }
    }
    out
}
