//! Scene path utilities
//!
//! Long names are `|`-separated (`|geo|charA:body`), selectors are the
//! namespace-stripped `/`-separated form used by per-face override
//! operators (`/geo/body`).

/// Strip the namespace prefix from a single node name
///
/// `charA:body` becomes `body`; nested namespaces are stripped whole.
pub fn strip_namespace(name: &str) -> &str {
    match name.rfind(':') {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}

/// Convert a `|`-separated long name into an override selector
///
/// Every component loses its namespace and separators become `/`, so
/// the selector resolves against the namespace-stripped hierarchy of
/// an exported cache.
pub fn selector_from_long_name(long_name: &str) -> String {
    let components: Vec<&str> = long_name
        .split('|')
        .filter(|c| !c.is_empty())
        .map(strip_namespace)
        .collect();

    format!("/{}", components.join("/"))
}

/// Check whether a shape name marks an original kept for history
///
/// Deformed meshes keep an `...ShapeOrig` duplicate around; those never
/// receive overrides.
pub fn is_orig_shape(name: &str) -> bool {
    strip_namespace(name).contains("ShapeOrig")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_namespace() {
        assert_eq!(strip_namespace("charA:body"), "body");
        assert_eq!(strip_namespace("a:b:body"), "body");
        assert_eq!(strip_namespace("body"), "body");
    }

    #[test]
    fn test_selector_from_long_name() {
        assert_eq!(selector_from_long_name("|geo|body"), "/geo/body");
        assert_eq!(selector_from_long_name("|charA:geo|charA:body"), "/geo/body");
        assert_eq!(selector_from_long_name("body"), "/body");
    }

    #[test]
    fn test_is_orig_shape() {
        assert!(is_orig_shape("bodyShapeOrig"));
        assert!(is_orig_shape("charA:bodyShapeOrig1"));
        assert!(!is_orig_shape("bodyShape"));
    }
}
