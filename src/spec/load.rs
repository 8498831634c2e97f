use anyhow::Context;
use oas3::OpenApiV3Spec;
use serde_json::Value;

/// Drop path-item keys that are neither HTTP verbs nor structural fields.
///
/// Documents in the wild carry tooling keys under path items that `oas3`
/// rejects; membership below mirrors the OpenAPI path-item object.
fn strip_unknown_verbs(val: &mut Value) {
    const METHODS: [&str; 8] = [
        "get", "post", "put", "delete", "patch", "options", "head", "trace",
    ];

    let Some(Value::Object(paths_map)) = val.get_mut("paths") else {
        return;
    };
    for item in paths_map.values_mut() {
        if let Value::Object(obj) = item {
            let keys: Vec<String> = obj.keys().cloned().collect();
            for k in keys {
                let lk = k.to_ascii_lowercase();
                let keep = match lk.as_str() {
                    "summary" | "description" | "servers" | "parameters" | "$ref" => true,
                    m if METHODS.contains(&m) => true,
                    _ => k.starts_with("x-"),
                };
                if !keep {
                    obj.remove(&k);
                }
            }
        }
    }
}

/// Load an API document from a YAML or JSON file.
///
/// Returns the parsed spec together with the sanitized raw document value; the
/// latter is what the context-tagging step attaches to every request.
pub fn load_document(file_path: &str) -> anyhow::Result<(OpenApiV3Spec, Value)> {
    let content = std::fs::read_to_string(file_path)
        .with_context(|| format!("failed to read API document at {file_path}"))?;
    let value: Value = if file_path.ends_with(".yaml") || file_path.ends_with(".yml") {
        serde_yaml::from_str(&content)?
    } else {
        serde_json::from_str(&content)?
    };
    load_document_value(value)
}

/// Load an API document supplied inline as a JSON value.
pub fn load_document_value(mut value: Value) -> anyhow::Result<(OpenApiV3Spec, Value)> {
    strip_unknown_verbs(&mut value);
    let spec: OpenApiV3Spec =
        serde_json::from_value(value.clone()).context("failed to parse OpenAPI document")?;
    Ok((spec, value))
}

/// Base paths the API is mounted under, derived from the `servers` entries.
///
/// Each server URL contributes its path component; a bare host contributes the
/// empty prefix. An API without servers is mounted at the root.
pub fn derive_base_paths(spec: &OpenApiV3Spec) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for server in &spec.servers {
        let url_str = &server.url;
        let path = url::Url::parse(url_str)
            .or_else(|_| url::Url::parse(&format!("http://dummy{url_str}")))
            .map(|u| {
                let p = u.path().trim_end_matches('/');
                if p == "/" || p.is_empty() {
                    String::new()
                } else {
                    p.to_string()
                }
            })
            .unwrap_or_default();
        if !out.contains(&path) {
            out.push(path);
        }
    }
    if out.is_empty() {
        out.push(String::new());
    }
    out
}
