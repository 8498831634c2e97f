use serde_json::Value;

use crate::request::OpenApiRequest;
use crate::spec::{OperationMeta, ParameterLocation, ParameterMeta, ParameterStyle};

/// Converts string path/query parameter values to their schema-declared types
/// before validation runs.
///
/// Built once per operation; absent when the operation declares no path or
/// query parameters with schemas, in which case the coercion step is elided
/// from the chain entirely.
pub struct Coercer {
    params: Vec<ParameterMeta>,
}

impl Coercer {
    pub fn new(op: &OperationMeta) -> Option<Self> {
        let params: Vec<ParameterMeta> = op
            .parameters
            .iter()
            .filter(|p| {
                matches!(
                    p.location,
                    ParameterLocation::Path | ParameterLocation::Query
                ) && p.schema.is_some()
            })
            .cloned()
            .collect();
        if params.is_empty() {
            return None;
        }
        Some(Self { params })
    }

    /// Retype matching parameters in place. Values that are not strings are
    /// left alone (already coerced, or supplied typed by the caller).
    pub fn coerce(&self, req: &mut OpenApiRequest) {
        for pm in &self.params {
            let target = match pm.location {
                ParameterLocation::Path => &mut req.params,
                ParameterLocation::Query => &mut req.query,
                _ => continue,
            };
            for (name, value) in target.iter_mut() {
                if name.as_ref() != pm.name {
                    continue;
                }
                if let Value::String(s) = value {
                    *value = decode_param_value(s, pm.schema.as_ref(), pm.style, pm.explode);
                }
            }
        }
    }
}

/// Decode a raw parameter string according to its schema and style.
///
/// Primitives parse to their JSON type and fall back to the original string
/// when the parse fails (validation then reports the mismatch). Arrays split
/// on the style's delimiter; objects parse as inline JSON.
pub fn decode_param_value(
    value: &str,
    schema: Option<&Value>,
    style: Option<ParameterStyle>,
    _explode: Option<bool>,
) -> Value {
    fn convert_primitive(val: &str, schema: Option<&Value>) -> Value {
        if let Some(ty) = schema.and_then(|s| s.get("type").and_then(|v| v.as_str())) {
            match ty {
                "integer" => val
                    .parse::<i64>()
                    .map(Value::from)
                    .unwrap_or_else(|_| Value::String(val.to_string())),
                "number" => val
                    .parse::<f64>()
                    .map(Value::from)
                    .unwrap_or_else(|_| Value::String(val.to_string())),
                "boolean" => val
                    .parse::<bool>()
                    .map(Value::from)
                    .unwrap_or_else(|_| Value::String(val.to_string())),
                _ => Value::String(val.to_string()),
            }
        } else {
            Value::String(val.to_string())
        }
    }

    if let Some(ty) = schema.and_then(|s| s.get("type").and_then(|v| v.as_str())) {
        match ty {
            "array" => {
                let items_schema = schema.and_then(|s| s.get("items"));
                let delim = match style.unwrap_or(ParameterStyle::Form) {
                    ParameterStyle::SpaceDelimited => ' ',
                    ParameterStyle::PipeDelimited => '|',
                    _ => ',',
                };
                let parts = value
                    .split(delim)
                    .filter(|s| !s.is_empty())
                    .map(|p| convert_primitive(p.trim(), items_schema))
                    .collect::<Vec<_>>();
                Value::Array(parts)
            }
            "object" => serde_json::from_str(value).unwrap_or(Value::String(value.to_string())),
            _ => convert_primitive(value, schema),
        }
    } else {
        Value::String(value.to_string())
    }
}
