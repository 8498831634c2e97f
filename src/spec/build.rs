use anyhow::bail;
use oas3::spec::{ObjectOrReference, Parameter};
use oas3::OpenApiV3Spec;
use serde_json::Value;

use super::types::{
    OperationMeta, ParameterLocation, ParameterMeta, ParameterStyle, ResponseSpec, Responses,
};
use super::SecurityScheme;

/// A problem found while walking the document for operations.
#[derive(Debug, Clone)]
pub struct SpecIssue {
    pub location: String,
    pub kind: String,
    pub message: String,
}

impl SpecIssue {
    fn new(
        location: impl Into<String>,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        SpecIssue {
            location: location.into(),
            kind: kind.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for SpecIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.location, self.message)
    }
}

/// Resolve a `#/components/schemas/...` reference to its schema definition.
pub fn resolve_schema_ref<'a>(
    spec: &'a OpenApiV3Spec,
    ref_path: &str,
) -> Option<&'a oas3::spec::ObjectSchema> {
    let name = ref_path.strip_prefix("#/components/schemas/")?;
    spec.components
        .as_ref()?
        .schemas
        .get(name)
        .and_then(|schema_ref| match schema_ref {
            ObjectOrReference::Object(schema) => Some(schema),
            _ => None,
        })
}

/// Recursively replace `$ref` objects in a schema value with their resolved
/// definitions, so validators can be compiled from a self-contained value.
pub fn expand_schema_refs(spec: &OpenApiV3Spec, value: &mut Value) {
    match value {
        Value::Object(obj) => {
            if let Some(ref_path) = obj.get("$ref").and_then(|v| v.as_str()) {
                if let Some(schema) = resolve_schema_ref(spec, ref_path) {
                    if let Ok(mut new_val) = serde_json::to_value(schema) {
                        expand_schema_refs(spec, &mut new_val);
                        *value = new_val;
                        return;
                    }
                }
            }
            for v in obj.values_mut() {
                expand_schema_refs(spec, v);
            }
        }
        Value::Array(arr) => {
            for v in arr.iter_mut() {
                expand_schema_refs(spec, v);
            }
        }
        _ => {}
    }
}

/// The operation identifier used to look up the handler and to name the route:
/// `operationId`, or the first `x-handler-*` vendor extension when absent.
fn resolve_operation_id(
    operation: &oas3::spec::Operation,
    location: &str,
    issues: &mut Vec<SpecIssue>,
) -> Option<String> {
    operation
        .operation_id
        .clone()
        .or_else(|| {
            operation.extensions.iter().find_map(|(key, val)| {
                if key.starts_with("x-handler") || key.starts_with("handler") {
                    if let Value::String(s) = val {
                        return Some(s.clone());
                    }
                }
                None
            })
        })
        .or_else(|| {
            issues.push(SpecIssue::new(
                location,
                "MissingOperationId",
                "Missing operationId or x-handler-* extension",
            ));
            None
        })
}

/// Request body schema, required flag, and consumed media types.
///
/// The schema is the `application/json` one (that is what the validators run
/// against); `consumes` lists every declared content key so consumer steps can
/// be matched against the caller-supplied table.
pub fn extract_request_body(
    spec: &OpenApiV3Spec,
    operation: &oas3::spec::Operation,
) -> (Option<Value>, bool, Vec<String>) {
    let mut required = false;
    let mut consumes = Vec::new();
    let mut schema = operation.request_body.as_ref().and_then(|r| match r {
        ObjectOrReference::Object(req_body) => {
            required = req_body.required.unwrap_or(false);
            consumes = req_body.content.keys().cloned().collect();
            req_body.content.get("application/json").and_then(|media| {
                match media.schema.as_ref()? {
                    ObjectOrReference::Object(schema_obj) => serde_json::to_value(schema_obj).ok(),
                    ObjectOrReference::Ref { ref_path, .. } => resolve_schema_ref(spec, ref_path)
                        .and_then(|s| serde_json::to_value(s).ok()),
                }
            })
        }
        _ => None,
    });
    if let Some(ref mut val) = schema {
        expand_schema_refs(spec, val);
    }
    (schema, required, consumes)
}

/// Response schemas for every declared (status, media type) pair.
pub fn extract_responses(spec: &OpenApiV3Spec, operation: &oas3::spec::Operation) -> Responses {
    let mut all: Responses = Responses::default();

    if let Some(responses_map) = operation.responses.as_ref() {
        for (status_str, resp_ref) in responses_map {
            let status: u16 = match status_str.parse() {
                Ok(v) => v,
                Err(_) => continue,
            };
            if let ObjectOrReference::Object(resp_obj) = resp_ref {
                if resp_obj.content.is_empty() {
                    // Declared but body-less (e.g. 204); keep the status known.
                    all.entry(status).or_default();
                    continue;
                }
                for (mt, media) in &resp_obj.content {
                    let mut schema = match media.schema.as_ref() {
                        Some(ObjectOrReference::Object(schema_obj)) => {
                            serde_json::to_value(schema_obj).ok()
                        }
                        Some(ObjectOrReference::Ref { ref_path, .. }) => {
                            resolve_schema_ref(spec, ref_path)
                                .and_then(|s| serde_json::to_value(s).ok())
                        }
                        None => None,
                    };
                    if let Some(ref mut val) = schema {
                        expand_schema_refs(spec, val);
                    }
                    all.entry(status)
                        .or_default()
                        .insert(mt.clone(), ResponseSpec { schema });
                }
            }
        }
    }
    all
}

/// All security schemes declared under `components.securitySchemes`.
pub fn extract_security_schemes(
    spec: &OpenApiV3Spec,
) -> std::collections::HashMap<String, SecurityScheme> {
    spec.components
        .as_ref()
        .map(|c| {
            c.security_schemes
                .iter()
                .filter_map(|(name, scheme)| match scheme {
                    ObjectOrReference::Object(obj) => Some((name.clone(), obj.clone())),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

fn resolve_parameter_ref<'a>(
    spec: &'a OpenApiV3Spec,
    ref_path: &str,
) -> Option<&'a oas3::spec::Parameter> {
    let name = ref_path.strip_prefix("#/components/parameters/")?;
    spec.components
        .as_ref()?
        .parameters
        .get(name)
        .and_then(|param_ref| match param_ref {
            ObjectOrReference::Object(param) => Some(param),
            _ => None,
        })
}

/// Resolve and flatten parameter metadata for path, query, header, and cookie
/// parameters, with schema `$ref`s expanded.
pub fn extract_parameters(
    spec: &OpenApiV3Spec,
    params: &Vec<ObjectOrReference<Parameter>>,
) -> Vec<ParameterMeta> {
    let mut out = Vec::new();
    for p in params {
        let param = match p {
            ObjectOrReference::Object(obj) => Some(obj),
            ObjectOrReference::Ref { ref_path, .. } => resolve_parameter_ref(spec, ref_path),
        };

        if let Some(param) = param {
            let mut schema = param.schema.as_ref().and_then(|s| match s {
                ObjectOrReference::Object(obj) => serde_json::to_value(obj).ok(),
                ObjectOrReference::Ref { ref_path, .. } => resolve_schema_ref(spec, ref_path)
                    .and_then(|sch| serde_json::to_value(sch).ok()),
            });
            if let Some(ref mut val) = schema {
                expand_schema_refs(spec, val);
            }

            out.push(ParameterMeta {
                name: param.name.clone(),
                location: ParameterLocation::from(param.location),
                required: param.required.unwrap_or(false),
                schema,
                style: param.style.map(ParameterStyle::from),
                explode: param.explode,
            });
        }
    }
    out
}

/// Whether the operation allows optional features at all.
///
/// `x-specrouter-features: false` turns every optional cross-cutting step off
/// for one operation without touching the rest of the API.
fn extract_features_flag(operation: &oas3::spec::Operation) -> bool {
    operation
        .extensions
        .get("x-specrouter-features")
        .or_else(|| operation.extensions.get("specrouter-features"))
        .and_then(|v| v.as_bool())
        .unwrap_or(true)
}

/// Walk the document and produce one [`OperationMeta`] per declared
/// (path, method) pair.
///
/// # Errors
///
/// Fails when any operation is missing an identifier; the error lists every
/// offending location so the document can be fixed in one pass.
pub fn build_operations(spec: &OpenApiV3Spec) -> anyhow::Result<Vec<OperationMeta>> {
    let mut operations = Vec::new();
    let mut issues = Vec::new();

    if let Some(paths_map) = spec.paths.as_ref() {
        for (path, item) in paths_map {
            for (method, operation) in item.methods() {
                let location = format!("{path} {method}");

                let operation_id = match resolve_operation_id(operation, &location, &mut issues) {
                    Some(id) => id,
                    None => continue,
                };

                let (request_schema, request_body_required, consumes) =
                    extract_request_body(spec, operation);
                let responses = extract_responses(spec, operation);

                let security = if !operation.security.is_empty() {
                    operation.security.clone()
                } else {
                    spec.security.clone()
                };

                let mut parameters = Vec::new();
                parameters.extend(extract_parameters(spec, &item.parameters));
                parameters.extend(extract_parameters(spec, &operation.parameters));

                let operation_doc = serde_json::to_value(operation).unwrap_or(Value::Null);

                operations.push(OperationMeta {
                    method,
                    path: path.clone(),
                    operation_id,
                    consumes,
                    parameters,
                    request_schema,
                    request_body_required,
                    responses,
                    security,
                    operation_doc,
                    allows_features: extract_features_flag(operation),
                });
            }
        }
    }

    if !issues.is_empty() {
        let report: Vec<String> = issues.iter().map(|i| i.to_string()).collect();
        bail!(
            "API document has {} invalid operation(s):\n{}",
            issues.len(),
            report.join("\n")
        );
    }
    Ok(operations)
}
