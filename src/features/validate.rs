use std::collections::{HashMap, HashSet};

use anyhow::anyhow;
use serde_json::{json, Value};

use crate::request::OpenApiRequest;
use crate::spec::{OperationMeta, ParameterLocation};

/// A request-validation failure: the HTTP status to answer with plus the
/// structured error payload, handed to the caller exactly as reported.
#[derive(Debug, Clone)]
pub struct ValidationFailure {
    pub status: u16,
    pub errors: Value,
}

/// A response-validation failure. Never surfaced to the client; the message
/// goes to the diagnostics collaborator and the response is replaced.
#[derive(Debug, Clone)]
pub struct ResponseValidationError {
    pub message: String,
}

struct CompiledParam {
    name: String,
    location: ParameterLocation,
    required: bool,
    // Compiled only for path/query parameters; header values are raw strings
    // that never pass through the coercer, so only presence is checked.
    schema: Option<jsonschema::Validator>,
}

/// Validates the normalized request view against the operation's declared
/// body schema and parameters. Validators are compiled once at startup.
pub struct RequestValidator {
    body: Option<jsonschema::Validator>,
    body_required: bool,
    params: Vec<CompiledParam>,
}

impl RequestValidator {
    /// Compile the operation's request validator, or `None` when the
    /// operation declares nothing to validate.
    pub fn new(op: &OperationMeta) -> anyhow::Result<Option<Self>> {
        let body = match &op.request_schema {
            Some(schema) => Some(compile(schema, &op.operation_id, "request body")?),
            None => None,
        };

        let mut params = Vec::new();
        for pm in &op.parameters {
            if pm.location == ParameterLocation::Cookie {
                continue;
            }
            let schema = match (&pm.schema, pm.location) {
                (Some(s), ParameterLocation::Path | ParameterLocation::Query) => Some(compile(
                    s,
                    &op.operation_id,
                    &format!("{} parameter `{}`", pm.location, pm.name),
                )?),
                _ => None,
            };
            params.push(CompiledParam {
                name: pm.name.clone(),
                location: pm.location,
                required: pm.required,
                schema,
            });
        }

        if body.is_none() && !op.request_body_required && params.is_empty() {
            return Ok(None);
        }
        Ok(Some(Self {
            body,
            body_required: op.request_body_required,
            params,
        }))
    }

    /// Validate the view; `Some` carries the status and payload to abort with.
    pub fn validate(&self, req: &OpenApiRequest) -> Option<ValidationFailure> {
        let mut errors: Vec<Value> = Vec::new();

        if self.body_required && req.body.is_none() {
            errors.push(json!({
                "location": "body",
                "message": "request body is required",
            }));
        }
        if let (Some(validator), Some(body)) = (&self.body, &req.body) {
            for err in validator.iter_errors(body) {
                errors.push(json!({
                    "location": "body",
                    "message": err.to_string(),
                }));
            }
        }

        for cp in &self.params {
            let found: Option<Value> = match cp.location {
                ParameterLocation::Path => req.get_param(&cp.name).cloned(),
                ParameterLocation::Query => req.get_query(&cp.name).cloned(),
                ParameterLocation::Header => req
                    .get_header(&cp.name)
                    .map(|s| Value::String(s.to_string())),
                ParameterLocation::Cookie => continue,
            };
            match found {
                None => {
                    if cp.required {
                        errors.push(json!({
                            "location": cp.location.to_string(),
                            "name": cp.name,
                            "message": "required parameter is missing",
                        }));
                    }
                }
                Some(value) => {
                    if let Some(validator) = &cp.schema {
                        for err in validator.iter_errors(&value) {
                            errors.push(json!({
                                "location": cp.location.to_string(),
                                "name": cp.name,
                                "message": err.to_string(),
                            }));
                        }
                    }
                }
            }
        }

        if errors.is_empty() {
            return None;
        }
        Some(ValidationFailure {
            status: 400,
            errors: json!({ "errors": errors }),
        })
    }
}

/// Validates the emitted response status and body against the operation's
/// declared responses. Only `application/json` bodies carry a compiled schema;
/// declared statuses without one pass unchecked, undeclared statuses fail.
pub struct ResponseValidator {
    by_status: HashMap<u16, jsonschema::Validator>,
    declared: HashSet<u16>,
}

impl ResponseValidator {
    /// Compile the operation's response validators, or `None` when the
    /// operation declares no responses at all.
    pub fn new(op: &OperationMeta) -> anyhow::Result<Option<Self>> {
        if op.responses.is_empty() {
            return Ok(None);
        }
        let mut by_status = HashMap::new();
        let mut declared = HashSet::new();
        for (status, media_map) in &op.responses {
            declared.insert(*status);
            let schema = media_map
                .get("application/json")
                .and_then(|spec| spec.schema.as_ref());
            if let Some(schema) = schema {
                by_status.insert(
                    *status,
                    compile(schema, &op.operation_id, &format!("response {status}"))?,
                );
            }
        }
        Ok(Some(Self {
            by_status,
            declared,
        }))
    }

    /// Check the final emitted response; `Some` means the response must be
    /// discarded.
    pub fn validate_response(&self, status: u16, body: &Value) -> Option<ResponseValidationError> {
        if let Some(validator) = self.by_status.get(&status) {
            let errs: Vec<String> = validator.iter_errors(body).map(|e| e.to_string()).collect();
            if errs.is_empty() {
                return None;
            }
            return Some(ResponseValidationError {
                message: format!(
                    "response body for status {status} does not match the declared schema: {}",
                    errs.join("; ")
                ),
            });
        }
        if self.declared.contains(&status) {
            return None;
        }
        Some(ResponseValidationError {
            message: format!("response status {status} is not declared in the API document"),
        })
    }
}

fn compile(schema: &Value, operation: &str, what: &str) -> anyhow::Result<jsonschema::Validator> {
    jsonschema::validator_for(schema)
        .map_err(|e| anyhow!("invalid {what} schema for operation `{operation}`: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{ParameterMeta, ResponseSpec, Responses};
    use http::Method;
    use std::sync::Arc;

    fn base_op() -> OperationMeta {
        OperationMeta {
            method: Method::POST,
            path: "/w".to_string(),
            operation_id: "create".to_string(),
            consumes: vec![],
            parameters: vec![],
            request_schema: None,
            request_body_required: false,
            responses: Responses::default(),
            security: vec![],
            operation_doc: Value::Null,
            allows_features: true,
        }
    }

    #[test]
    fn test_nothing_to_validate_yields_no_validator() {
        assert!(RequestValidator::new(&base_op()).unwrap().is_none());
    }

    #[test]
    fn test_body_schema_violation_reports_400() {
        let mut op = base_op();
        op.request_schema = Some(json!({
            "type": "object",
            "properties": { "name": { "type": "string" } },
            "required": ["name"]
        }));
        let validator = RequestValidator::new(&op).unwrap().unwrap();

        let mut req = OpenApiRequest::default();
        req.body = Some(json!({}));
        let failure = validator.validate(&req).unwrap();
        assert_eq!(failure.status, 400);
        assert!(!failure.errors["errors"].as_array().unwrap().is_empty());

        req.body = Some(json!({ "name": "x" }));
        assert!(validator.validate(&req).is_none());
    }

    #[test]
    fn test_required_query_param_missing() {
        let mut op = base_op();
        op.parameters.push(ParameterMeta {
            name: "limit".to_string(),
            location: ParameterLocation::Query,
            required: true,
            schema: Some(json!({ "type": "integer" })),
            style: None,
            explode: None,
        });
        let validator = RequestValidator::new(&op).unwrap().unwrap();

        let req = OpenApiRequest::default();
        let failure = validator.validate(&req).unwrap();
        assert_eq!(failure.status, 400);

        let mut req = OpenApiRequest::default();
        req.query.push((Arc::from("limit"), json!(10)));
        assert!(validator.validate(&req).is_none());
    }

    #[test]
    fn test_uncoerced_string_fails_typed_schema() {
        let mut op = base_op();
        op.parameters.push(ParameterMeta {
            name: "limit".to_string(),
            location: ParameterLocation::Query,
            required: false,
            schema: Some(json!({ "type": "integer" })),
            style: None,
            explode: None,
        });
        let validator = RequestValidator::new(&op).unwrap().unwrap();
        let mut req = OpenApiRequest::default();
        req.query.push((Arc::from("limit"), json!("10")));
        assert!(validator.validate(&req).is_some());
    }

    fn op_with_response(status: u16, schema: Value) -> OperationMeta {
        let mut op = base_op();
        let mut media = HashMap::new();
        media.insert(
            "application/json".to_string(),
            ResponseSpec {
                schema: Some(schema),
            },
        );
        op.responses.insert(status, media);
        op
    }

    #[test]
    fn test_response_schema_violation_is_reported() {
        let op = op_with_response(
            200,
            json!({
                "type": "object",
                "properties": { "id": { "type": "integer" } },
                "required": ["id"]
            }),
        );
        let validator = ResponseValidator::new(&op).unwrap().unwrap();
        assert!(validator.validate_response(200, &json!({})).is_some());
        assert!(validator
            .validate_response(200, &json!({ "id": 7 }))
            .is_none());
    }

    #[test]
    fn test_undeclared_status_is_a_failure() {
        let op = op_with_response(200, json!({ "type": "object" }));
        let validator = ResponseValidator::new(&op).unwrap().unwrap();
        let err = validator.validate_response(418, &Value::Null).unwrap();
        assert!(err.message.contains("418"));
    }

    #[test]
    fn test_declared_status_without_schema_passes() {
        let mut op = base_op();
        op.responses.insert(204, HashMap::new());
        let validator = ResponseValidator::new(&op).unwrap().unwrap();
        assert!(validator.validate_response(204, &Value::Null).is_none());
    }
}
