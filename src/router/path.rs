use once_cell::sync::Lazy;
use regex::Regex;

// `name` may not contain `}` or `/`. Literal braces are not escapable.
static TEMPLATE_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^}/]+)\}").expect("template parameter pattern is valid"));

/// Translate a document path template into the router's parameter syntax and
/// mount it under a base path.
///
/// The base path and the operation path are concatenated with exactly one
/// duplicate leading separator stripped, then every `{name}` token becomes
/// `:name`: `translate_path("/v1", "/widgets/{id}")` → `/v1/widgets/:id`.
pub fn translate_path(base_path: &str, path: &str) -> String {
    let rest = path.strip_prefix('/').unwrap_or(path);
    let joined = format!("{base_path}/{rest}");
    TEMPLATE_PARAM.replace_all(&joined, ":$1").into_owned()
}
