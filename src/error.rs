use http::Method;
use serde_json::Value;

use crate::response::HandlerResponse;

/// Error raised by a middleware step to abort the remaining chain.
///
/// Every variant is terminal for the current request: no later step (including
/// the operation handler) runs once one of these is produced. Spec-loading and
/// chain-building failures are reported through `anyhow` at startup instead.
#[derive(Debug)]
pub enum ChainError {
    /// Request validation failed. Carries the status code and the structured
    /// error payload exactly as the validator reported them.
    Validation { status: u16, errors: Value },
    /// The security evaluator rejected the request. Propagated unwrapped.
    Unauthorized { errors: Value },
    /// A mapped path exists, but not for the requested method.
    /// Produced only by the allowed-methods responder in throw mode.
    MethodNotAllowed { allow: Vec<Method> },
    /// No mapped path matches the request at all.
    /// Produced only by the allowed-methods responder in throw mode.
    NotImplemented,
}

impl ChainError {
    /// HTTP status code this error maps to.
    pub fn status(&self) -> u16 {
        match self {
            ChainError::Validation { status, .. } => *status,
            ChainError::Unauthorized { .. } => 401,
            ChainError::MethodNotAllowed { .. } => 405,
            ChainError::NotImplemented => 501,
        }
    }

    /// Convert the error into a response an embedding server can write out.
    ///
    /// `MethodNotAllowed` carries its `Allow` header; validation and security
    /// errors carry their JSON payload as the body.
    pub fn into_response(self) -> HandlerResponse {
        match self {
            ChainError::Validation { status, errors } => HandlerResponse::json(status, errors),
            ChainError::Unauthorized { errors } => HandlerResponse::json(401, errors),
            ChainError::MethodNotAllowed { allow } => {
                let mut res = HandlerResponse::new(405, Default::default(), Value::Null);
                res.set_header("Allow", join_methods(&allow));
                res
            }
            ChainError::NotImplemented => {
                HandlerResponse::new(501, Default::default(), Value::Null)
            }
        }
    }
}

pub(crate) fn join_methods(methods: &[Method]) -> String {
    methods
        .iter()
        .map(|m| m.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl std::fmt::Display for ChainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChainError::Validation { status, errors } => {
                write!(f, "request validation failed with status {status}: {errors}")
            }
            ChainError::Unauthorized { errors } => {
                write!(f, "security evaluation rejected the request: {errors}")
            }
            ChainError::MethodNotAllowed { allow } => {
                write!(f, "method not allowed; allowed: {}", join_methods(allow))
            }
            ChainError::NotImplemented => write!(f, "not implemented"),
        }
    }
}

impl std::error::Error for ChainError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let err = ChainError::Validation {
            status: 400,
            errors: serde_json::json!({"errors": []}),
        };
        assert_eq!(err.status(), 400);
        assert_eq!(ChainError::NotImplemented.status(), 501);
    }

    #[test]
    fn test_method_not_allowed_response_carries_allow_header() {
        let err = ChainError::MethodNotAllowed {
            allow: vec![Method::GET, Method::POST],
        };
        let res = err.into_response();
        assert_eq!(res.status, 405);
        assert_eq!(res.get_header("allow"), Some("GET, POST"));
    }
}
