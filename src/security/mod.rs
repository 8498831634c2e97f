//! Security evaluation for operations that declare security requirements.
//!
//! Implement [`SecurityProvider`] to plug in custom credential checks; the
//! crate ships a header/query/cookie [`ApiKeyProvider`] and a simplified
//! [`BearerJwtProvider`]. Providers are registered by scheme name and invoked
//! by the [`SecurityEvaluator`] that the chain's security step wraps.
//!
//! Evaluation may block the calling execution context (a provider is free to
//! make a remote lookup); this layer imposes no timeout.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;
use tracing::warn;

use crate::error::ChainError;
use crate::request::{HeaderVec, ParamVec};
use crate::spec::{SecurityRequirement, SecurityScheme};

mod api_key;
mod bearer_jwt;

pub use api_key::ApiKeyProvider;
pub use bearer_jwt::BearerJwtProvider;

/// Credential view handed to providers: headers, query parameters, cookies.
pub struct SecurityRequest<'a> {
    pub headers: &'a HeaderVec,
    pub query: &'a ParamVec,
    pub cookies: &'a HeaderVec,
}

impl<'a> SecurityRequest<'a> {
    /// Get a header by name (case-insensitive).
    #[inline]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Get a query parameter by name. Only string values count as
    /// credentials; coerced values never are.
    #[inline]
    pub fn get_query(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .and_then(|(_, v)| v.as_str())
    }

    /// Get a cookie by name.
    #[inline]
    pub fn get_cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Validates a request's credentials against one security scheme.
pub trait SecurityProvider: Send + Sync {
    /// `true` when the request is authenticated and authorized for `scopes`
    /// under `scheme`.
    fn validate(&self, scheme: &SecurityScheme, scopes: &[String], req: &SecurityRequest) -> bool;
}

/// Evaluates an operation's declared security requirements.
///
/// Standard OpenAPI semantics: requirements are alternatives (any one
/// satisfied requirement authorizes the request), and every scheme inside one
/// requirement must hold. A scheme with no registered provider fails its
/// requirement.
pub struct SecurityEvaluator {
    requirements: Vec<SecurityRequirement>,
    schemes: HashMap<String, SecurityScheme>,
    providers: HashMap<String, Arc<dyn SecurityProvider>>,
}

impl SecurityEvaluator {
    pub fn new(
        requirements: Vec<SecurityRequirement>,
        schemes: HashMap<String, SecurityScheme>,
        providers: HashMap<String, Arc<dyn SecurityProvider>>,
    ) -> Self {
        Self {
            requirements,
            schemes,
            providers,
        }
    }

    /// Evaluate the request; `Err` aborts the chain and is propagated to the
    /// caller unwrapped.
    pub fn evaluate(&self, req: &SecurityRequest) -> Result<(), ChainError> {
        for requirement in &self.requirements {
            let mut ok = true;
            for (scheme_name, scopes) in &requirement.0 {
                let scheme = match self.schemes.get(scheme_name) {
                    Some(s) => s,
                    None => {
                        warn!(scheme = %scheme_name, "security scheme not declared in document");
                        ok = false;
                        break;
                    }
                };
                let provider = match self.providers.get(scheme_name) {
                    Some(p) => p,
                    None => {
                        warn!(scheme = %scheme_name, "no security provider registered");
                        ok = false;
                        break;
                    }
                };
                if !provider.validate(scheme, scopes, req) {
                    ok = false;
                    break;
                }
            }
            if ok {
                return Ok(());
            }
        }
        Err(ChainError::Unauthorized {
            errors: json!({ "error": "Unauthorized" }),
        })
    }
}
