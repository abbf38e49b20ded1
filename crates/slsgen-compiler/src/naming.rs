//! Function names, handler references and path rewriting.

use std::path::Path;

/// Deterministic function key: `{verb}-{base path slug}-{method path slug}`.
///
/// Every run of non-alphanumeric characters becomes one hyphen and empty
/// segments are dropped, so a route without a sub-path has no trailing hyphen.
pub fn function_name(verb: &str, base_path: &str, path_template: &str) -> String {
    let mut parts = vec![verb.to_string()];
    parts.extend(slug_parts(base_path));
    parts.extend(slug_parts(path_template));
    parts.join("-")
}

fn slug_parts(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect()
}

/// Rewrite `/:name` segments to `/{name}`.
pub fn rewrite_path(path: &str) -> String {
    path.split('/')
        .enumerate()
        .map(|(i, segment)| match segment.strip_prefix(':') {
            Some(name) if i > 0 && !name.is_empty() => format!("{{{name}}}"),
            _ => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// First character upper-cased, the rest lower-cased.
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Handler reference: entry file relative to `root`, without a `.ts`/`.js`
/// extension, followed by `.{method_key}`.
pub fn handler_path(entry_file: &Path, root: &Path, method_key: &str) -> String {
    let relative = entry_file.strip_prefix(root).unwrap_or(entry_file);
    let relative = relative.to_string_lossy().replace('\\', "/");
    let module = relative
        .strip_suffix(".ts")
        .or_else(|| relative.strip_suffix(".js"))
        .unwrap_or(&relative);
    format!("{module}.{method_key}")
}

/// Deployed function name: `{service}-{stage}-{function}`.
pub fn deployed_name(service: &str, stage: &str, function: &str) -> String {
    format!("{service}-{stage}-{function}")
}
