use base64::{engine::general_purpose, Engine as _};
use serde_json::Value;
use tracing::{debug, warn};

use crate::security::{SecurityProvider, SecurityRequest};
use crate::spec::SecurityScheme;

/// Simplified Bearer/JWT provider for `http: bearer` schemes.
///
/// Tokens have the form `header.payload.signature`; the signature part must
/// match the configured signature string, and the base64 payload must carry a
/// whitespace-separated `scope` claim covering every required scope. Suitable
/// for tests and internal services; not a substitute for real JWT validation.
pub struct BearerJwtProvider {
    signature: String,
    cookie_name: Option<String>,
}

impl BearerJwtProvider {
    pub fn new(signature: impl Into<String>) -> Self {
        Self {
            signature: signature.into(),
            cookie_name: None,
        }
    }

    /// Read the token from a cookie instead of the `Authorization` header.
    pub fn cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = Some(name.into());
        self
    }

    fn extract_token<'a>(&self, req: &'a SecurityRequest) -> Option<&'a str> {
        if let Some(name) = &self.cookie_name {
            if let Some(t) = req.get_cookie(name) {
                return Some(t);
            }
        }
        req.get_header("authorization")
            .and_then(|h| h.strip_prefix("Bearer "))
    }

    fn validate_token(&self, token: &str, scopes: &[String]) -> bool {
        let mut parts = token.split('.');
        let header = parts.next();
        let payload = parts.next();
        let sig = parts.next();
        if header.is_none() || payload.is_none() || sig != Some(self.signature.as_str()) {
            debug!("bearer token rejected: malformed token or invalid signature");
            return false;
        }
        let Some(payload) = payload else { return false };
        let payload_bytes = match general_purpose::STANDARD.decode(payload) {
            Ok(b) => b,
            Err(e) => {
                debug!("bearer token rejected: invalid base64 payload - {e:?}");
                return false;
            }
        };
        let json: Value = match serde_json::from_slice(&payload_bytes) {
            Ok(v) => v,
            Err(e) => {
                debug!("bearer token rejected: invalid JSON payload - {e:?}");
                return false;
            }
        };
        let token_scopes = json.get("scope").and_then(|v| v.as_str()).unwrap_or("");
        let has_all_scopes = scopes
            .iter()
            .all(|s| token_scopes.split_whitespace().any(|ts| ts == s));
        if !has_all_scopes {
            warn!(
                token_scopes = %token_scopes,
                required = ?scopes,
                "bearer token rejected: missing required scopes"
            );
        }
        has_all_scopes
    }
}

impl SecurityProvider for BearerJwtProvider {
    fn validate(&self, scheme: &SecurityScheme, scopes: &[String], req: &SecurityRequest) -> bool {
        match scheme {
            SecurityScheme::Http { scheme, .. } if scheme.eq_ignore_ascii_case("bearer") => {}
            _ => return false,
        }
        let Some(token) = self.extract_token(req) else {
            return false;
        };
        self.validate_token(token, scopes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{HeaderVec, ParamVec};
    use std::sync::Arc;

    fn bearer_scheme() -> SecurityScheme {
        serde_json::from_value(serde_json::json!({
            "type": "http",
            "scheme": "bearer"
        }))
        .unwrap()
    }

    fn token_with_scope(scope: &str, signature: &str) -> String {
        let payload =
            general_purpose::STANDARD.encode(format!("{{\"scope\":\"{scope}\"}}").as_bytes());
        format!("h.{payload}.{signature}")
    }

    #[test]
    fn test_valid_token_with_scopes() {
        let provider = BearerJwtProvider::new("sig");
        let mut headers = HeaderVec::new();
        headers.push((
            Arc::from("authorization"),
            format!("Bearer {}", token_with_scope("read write", "sig")),
        ));
        let query = ParamVec::new();
        let cookies = HeaderVec::new();
        let req = SecurityRequest {
            headers: &headers,
            query: &query,
            cookies: &cookies,
        };
        assert!(provider.validate(&bearer_scheme(), &["read".to_string()], &req));
    }

    #[test]
    fn test_bad_signature_rejected() {
        let provider = BearerJwtProvider::new("sig");
        let mut headers = HeaderVec::new();
        headers.push((
            Arc::from("authorization"),
            format!("Bearer {}", token_with_scope("read", "other")),
        ));
        let query = ParamVec::new();
        let cookies = HeaderVec::new();
        let req = SecurityRequest {
            headers: &headers,
            query: &query,
            cookies: &cookies,
        };
        assert!(!provider.validate(&bearer_scheme(), &[], &req));
    }

    #[test]
    fn test_missing_scope_rejected() {
        let provider = BearerJwtProvider::new("sig");
        let mut headers = HeaderVec::new();
        headers.push((
            Arc::from("authorization"),
            format!("Bearer {}", token_with_scope("read", "sig")),
        ));
        let query = ParamVec::new();
        let cookies = HeaderVec::new();
        let req = SecurityRequest {
            headers: &headers,
            query: &query,
            cookies: &cookies,
        };
        assert!(!provider.validate(&bearer_scheme(), &["admin".to_string()], &req));
    }

    #[test]
    fn test_token_from_cookie() {
        let provider = BearerJwtProvider::new("sig").cookie_name("auth");
        let headers = HeaderVec::new();
        let query = ParamVec::new();
        let mut cookies = HeaderVec::new();
        cookies.push((Arc::from("auth"), token_with_scope("read", "sig")));
        let req = SecurityRequest {
            headers: &headers,
            query: &query,
            cookies: &cookies,
        };
        assert!(provider.validate(&bearer_scheme(), &["read".to_string()], &req));
    }
}
