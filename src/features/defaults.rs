use std::sync::Arc;

use serde_json::Value;

use crate::request::OpenApiRequest;
use crate::spec::{OperationMeta, ParameterLocation};

/// Applies schema-declared `default` values to the request view before
/// validation: absent query/header parameters get their declared defaults, and
/// absent body object properties are filled recursively.
///
/// Purely synchronous; absent when the operation declares no defaults, in
/// which case the step is elided.
pub struct DefaultSetter {
    query: Vec<(Arc<str>, Value)>,
    headers: Vec<(Arc<str>, Value)>,
    body_schema: Option<Value>,
}

impl DefaultSetter {
    pub fn new(op: &OperationMeta) -> Option<Self> {
        if !op.declares_defaults() {
            return None;
        }
        let mut query = Vec::new();
        let mut headers = Vec::new();
        for pm in &op.parameters {
            let Some(default) = pm
                .schema
                .as_ref()
                .and_then(|s| s.get("default"))
                .cloned()
            else {
                continue;
            };
            match pm.location {
                ParameterLocation::Query => {
                    query.push((Arc::from(pm.name.as_str()), default));
                }
                ParameterLocation::Header => {
                    headers.push((Arc::from(pm.name.to_ascii_lowercase().as_str()), default));
                }
                // A path parameter is always present once the route matched;
                // a default would never apply.
                _ => {}
            }
        }
        Some(Self {
            query,
            headers,
            body_schema: op.request_schema.clone(),
        })
    }

    /// Mutate the request view in place.
    pub fn apply(&self, req: &mut OpenApiRequest) {
        for (name, default) in &self.query {
            if req.get_query(name).is_none() {
                req.query.push((name.clone(), default.clone()));
            }
        }
        for (name, default) in &self.headers {
            if req.get_header(name).is_none() {
                req.headers.push((name.clone(), header_string(default)));
            }
        }
        if let (Some(schema), Some(body)) = (&self.body_schema, &mut req.body) {
            apply_object_defaults(schema, body);
        }
    }
}

fn header_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn apply_object_defaults(schema: &Value, value: &mut Value) {
    let Some(props) = schema.get("properties").and_then(|p| p.as_object()) else {
        return;
    };
    let Value::Object(map) = value else {
        return;
    };
    for (key, prop_schema) in props {
        if map.contains_key(key) {
            if let Some(existing) = map.get_mut(key) {
                apply_object_defaults(prop_schema, existing);
            }
        } else if let Some(default) = prop_schema.get("default") {
            map.insert(key.clone(), default.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{ParameterMeta, ParameterStyle, Responses};
    use http::Method;
    use serde_json::json;

    fn op_with(parameters: Vec<ParameterMeta>, request_schema: Option<Value>) -> OperationMeta {
        OperationMeta {
            method: Method::POST,
            path: "/w".to_string(),
            operation_id: "create".to_string(),
            consumes: vec![],
            parameters,
            request_schema,
            request_body_required: false,
            responses: Responses::default(),
            security: vec![],
            operation_doc: Value::Null,
            allows_features: true,
        }
    }

    fn query_param(name: &str, schema: Value) -> ParameterMeta {
        ParameterMeta {
            name: name.to_string(),
            location: ParameterLocation::Query,
            required: false,
            schema: Some(schema),
            style: Some(ParameterStyle::Form),
            explode: None,
        }
    }

    #[test]
    fn test_absent_query_param_gets_default() {
        let op = op_with(
            vec![query_param("limit", json!({ "type": "integer", "default": 20 }))],
            None,
        );
        let setter = DefaultSetter::new(&op).unwrap();
        let mut req = OpenApiRequest::default();
        setter.apply(&mut req);
        assert_eq!(req.get_query("limit"), Some(&json!(20)));
    }

    #[test]
    fn test_present_query_param_is_untouched() {
        let op = op_with(
            vec![query_param("limit", json!({ "type": "integer", "default": 20 }))],
            None,
        );
        let setter = DefaultSetter::new(&op).unwrap();
        let mut req = OpenApiRequest::default();
        req.query.push((Arc::from("limit"), json!("5")));
        setter.apply(&mut req);
        assert_eq!(req.get_query("limit"), Some(&json!("5")));
        assert_eq!(req.query.len(), 1);
    }

    #[test]
    fn test_body_defaults_fill_missing_properties_recursively() {
        let op = op_with(
            vec![],
            Some(json!({
                "type": "object",
                "properties": {
                    "tag": { "type": "string", "default": "none" },
                    "meta": {
                        "type": "object",
                        "properties": {
                            "weight": { "type": "integer", "default": 1 }
                        }
                    }
                }
            })),
        );
        let setter = DefaultSetter::new(&op).unwrap();
        let mut req = OpenApiRequest::default();
        req.body = Some(json!({ "meta": {} }));
        setter.apply(&mut req);
        assert_eq!(req.body, Some(json!({ "tag": "none", "meta": { "weight": 1 } })));
    }

    #[test]
    fn test_operation_without_defaults_has_no_setter() {
        let op = op_with(vec![query_param("limit", json!({ "type": "integer" }))], None);
        assert!(DefaultSetter::new(&op).is_none());
    }
}
