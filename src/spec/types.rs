use http::Method;
use serde_json::Value;

use super::SecurityRequirement;

/// Where a declared parameter lives on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

/// OpenAPI parameter serialization style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterStyle {
    Matrix,
    Label,
    Form,
    Simple,
    SpaceDelimited,
    PipeDelimited,
    DeepObject,
}

impl From<oas3::spec::ParameterStyle> for ParameterStyle {
    fn from(style: oas3::spec::ParameterStyle) -> Self {
        use oas3::spec::ParameterStyle as PS;
        match style {
            PS::Matrix => ParameterStyle::Matrix,
            PS::Label => ParameterStyle::Label,
            PS::Form => ParameterStyle::Form,
            PS::Simple => ParameterStyle::Simple,
            PS::SpaceDelimited => ParameterStyle::SpaceDelimited,
            PS::PipeDelimited => ParameterStyle::PipeDelimited,
            PS::DeepObject => ParameterStyle::DeepObject,
        }
    }
}

impl From<oas3::spec::ParameterIn> for ParameterLocation {
    fn from(loc: oas3::spec::ParameterIn) -> Self {
        match loc {
            oas3::spec::ParameterIn::Path => ParameterLocation::Path,
            oas3::spec::ParameterIn::Query => ParameterLocation::Query,
            oas3::spec::ParameterIn::Header => ParameterLocation::Header,
            oas3::spec::ParameterIn::Cookie => ParameterLocation::Cookie,
        }
    }
}

impl std::fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParameterLocation::Path => write!(f, "path"),
            ParameterLocation::Query => write!(f, "query"),
            ParameterLocation::Header => write!(f, "header"),
            ParameterLocation::Cookie => write!(f, "cookie"),
        }
    }
}

/// Metadata for one declared parameter, with `$ref`s already resolved.
#[derive(Debug, Clone)]
pub struct ParameterMeta {
    pub name: String,
    pub location: ParameterLocation,
    pub required: bool,
    pub schema: Option<Value>,
    pub style: Option<ParameterStyle>,
    pub explode: Option<bool>,
}

/// One declared response body for a (status, media type) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSpec {
    pub schema: Option<Value>,
}

/// Declared responses keyed by status code, then media type.
pub type Responses =
    std::collections::HashMap<u16, std::collections::HashMap<String, ResponseSpec>>;

/// Everything the adapter needs to know about one declared operation:
/// one (path, method) pair from the API document, with schemas resolved and
/// the operation's own document fragment retained for context tagging.
#[derive(Debug, Clone)]
pub struct OperationMeta {
    pub method: Method,
    /// Path template in the document's brace syntax (`/widgets/{id}`)
    pub path: String,
    /// `operationId`, or the first `x-handler-*` extension when absent
    pub operation_id: String,
    /// Media types the operation consumes (request body content keys)
    pub consumes: Vec<String>,
    pub parameters: Vec<ParameterMeta>,
    pub request_schema: Option<Value>,
    pub request_body_required: bool,
    pub responses: Responses,
    pub security: Vec<SecurityRequirement>,
    /// The operation's raw document fragment, tagged onto each request
    pub operation_doc: Value,
    /// `false` when the operation opts out of optional features via the
    /// `x-specrouter-features` extension
    pub allows_features: bool,
}

impl OperationMeta {
    /// Whether the operation declares any schema with a `default` anywhere a
    /// default setter could apply one.
    pub fn declares_defaults(&self) -> bool {
        let param_default = self.parameters.iter().any(|p| {
            p.schema
                .as_ref()
                .map(|s| s.get("default").is_some())
                .unwrap_or(false)
        });
        param_default || schema_has_defaults(self.request_schema.as_ref())
    }
}

fn schema_has_defaults(schema: Option<&Value>) -> bool {
    match schema {
        Some(Value::Object(obj)) => {
            obj.contains_key("default")
                || obj.values().any(|v| schema_has_defaults(Some(v)))
        }
        Some(Value::Array(arr)) => arr.iter().any(|v| schema_has_defaults(Some(v))),
        _ => false,
    }
}
