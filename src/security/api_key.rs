use crate::security::{SecurityProvider, SecurityRequest};
use crate::spec::SecurityScheme;
use tracing::debug;

/// Static API key provider for `apiKey` schemes.
///
/// Reads the credential from the location the scheme declares (header, query
/// parameter, or cookie) and compares it against the configured key.
pub struct ApiKeyProvider {
    key: String,
}

impl ApiKeyProvider {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl SecurityProvider for ApiKeyProvider {
    fn validate(&self, scheme: &SecurityScheme, _scopes: &[String], req: &SecurityRequest) -> bool {
        let presented = match scheme {
            SecurityScheme::ApiKey { name, location, .. } if location == "header" => {
                req.get_header(name)
            }
            SecurityScheme::ApiKey { name, location, .. } if location == "query" => {
                req.get_query(name)
            }
            SecurityScheme::ApiKey { name, location, .. } if location == "cookie" => {
                req.get_cookie(name)
            }
            _ => {
                debug!("ApiKeyProvider invoked for a non-apiKey scheme");
                return false;
            }
        };
        presented.map(|k| k == self.key).unwrap_or(false)
    }
}
