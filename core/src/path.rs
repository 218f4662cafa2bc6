//! Route path helpers.
//!
//! Wildcards are path segments of the form `/:name` or `/*name`. A route key
//! is the path with every wildcard segment replaced by `/*`, which gives a
//! signature of the path shape independent of wildcard naming.
//!
//! # Examples
//!
//! ```
//! use api_design_core::{extract_wildcards, join_paths, route_key};
//!
//! let path = join_paths("/widgets/:id", "items/:itemId");
//! assert_eq!(path, "/widgets/:id/items/:itemId");
//! assert_eq!(extract_wildcards(&path), vec!["id", "itemId"]);
//! assert_eq!(route_key(&path), "/widgets/*/items/*");
//! ```

use std::sync::LazyLock;

use regex::Regex;

static WILDCARD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/(?::|\*)([a-zA-Z0-9_]+)").expect("static regex must compile")
});

/// Placeholder segment used in route keys.
pub const WILDCARD_PLACEHOLDER: &str = "/*";

/// Returns the wildcard names of `path`, in order of appearance.
pub fn extract_wildcards(path: &str) -> Vec<String> {
    WILDCARD_RE
        .captures_iter(path)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Returns the shape-only key of `path`.
pub fn route_key(path: &str) -> String {
    WILDCARD_RE
        .replace_all(path, regex::NoExpand(WILDCARD_PLACEHOLDER))
        .into_owned()
}

/// Returns `true` if `path` ignores any base path (starts with `//`).
pub fn is_absolute(path: &str) -> bool {
    path.starts_with("//")
}

/// Joins `path` onto `base` and cleans the result.
///
/// Paths starting with `//` are absolute and replace the base entirely.
pub fn join_paths(base: &str, path: &str) -> String {
    if is_absolute(path) {
        return clean_path(&path[1..]);
    }
    clean_path(&format!("{base}/{path}"))
}

/// Normalizes a path: collapses repeated slashes, resolves `.` and `..`
/// segments and always returns a rooted path without trailing slash.
pub fn clean_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    format!("/{}", segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_wildcards_both_forms() {
        assert_eq!(
            extract_wildcards("/files/:bucket/*filepath"),
            vec!["bucket", "filepath"]
        );
        assert!(extract_wildcards("/widgets").is_empty());
    }

    #[test]
    fn test_route_key_ignores_names() {
        assert_eq!(route_key("/widgets/:id"), route_key("/widgets/:widgetId"));
        assert_eq!(route_key("/widgets/:id/items"), "/widgets/*/items");
    }

    #[test]
    fn test_join_paths_cleans() {
        assert_eq!(join_paths("/", ""), "/");
        assert_eq!(join_paths("/api/", "/widgets/"), "/api/widgets");
        assert_eq!(join_paths("/api/v1", "../v2/things"), "/api/v2/things");
    }

    #[test]
    fn test_join_paths_absolute() {
        assert_eq!(join_paths("/api", "//health"), "/health");
        assert!(is_absolute("//health"));
    }
}
