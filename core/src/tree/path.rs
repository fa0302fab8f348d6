/// Separator between keys in a task path.
pub const PATH_SEPARATOR: char = ':';

/// Build a child path from its parent path (if any) and key.
pub fn join_path(parent: Option<&str>, key: &str) -> String {
    match parent {
        Some(parent) if !parent.is_empty() => format!("{parent}{PATH_SEPARATOR}{key}"),
        _ => key.to_string(),
    }
}

/// Parent path of `path`, or `None` for a top-level node.
pub fn parent_path(path: &str) -> Option<&str> {
    path.rfind(PATH_SEPARATOR).map(|idx| &path[..idx])
}

/// True if `path` equals `ancestor` or lies underneath it.
pub fn is_same_or_descendant(path: &str, ancestor: &str) -> bool {
    path == ancestor
        || (path.len() > ancestor.len()
            && path.starts_with(ancestor)
            && path[ancestor.len()..].starts_with(PATH_SEPARATOR))
}

/// True if `path` lies strictly underneath `ancestor`.
pub fn is_strict_descendant(path: &str, ancestor: &str) -> bool {
    path != ancestor && is_same_or_descendant(path, ancestor)
}

/// Filter match: exact path or colon-prefix.
pub fn matches_filter(path: &str, filter: &str) -> bool {
    let filter = filter.trim_end_matches(PATH_SEPARATOR);
    !filter.is_empty() && is_same_or_descendant(path, filter)
}

/// Normalize an identifier written with `.` separators into a task path.
pub fn normalize_identifier(identifier: &str) -> String {
    identifier.replace('.', &PATH_SEPARATOR.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_and_splits() {
        assert_eq!(join_path(None, "lint"), "lint");
        assert_eq!(join_path(Some("lint"), "eslint"), "lint:eslint");
        assert_eq!(parent_path("a:b:c"), Some("a:b"));
        assert_eq!(parent_path("a"), None);
    }

    #[test]
    fn descendant_checks_respect_segment_boundaries() {
        assert!(is_same_or_descendant("lint:eslint", "lint"));
        assert!(is_same_or_descendant("lint", "lint"));
        assert!(!is_same_or_descendant("linter", "lint"));
        assert!(!is_strict_descendant("lint", "lint"));
        assert!(is_strict_descendant("a:b:c", "a"));
    }

    #[test]
    fn filter_matching() {
        assert!(matches_filter("lint:eslint", "lint"));
        assert!(matches_filter("lint:eslint", "lint:eslint"));
        assert!(matches_filter("lint:eslint", "lint:"));
        assert!(!matches_filter("lint:eslint", "lint:tsc"));
        assert!(!matches_filter("lint", "lint:eslint"));
        assert!(!matches_filter("lint", ""));
    }

    #[test]
    fn dotted_identifiers_normalize() {
        assert_eq!(normalize_identifier("pkg.lint.eslint"), "pkg:lint:eslint");
        assert_eq!(normalize_identifier("pkg:lint"), "pkg:lint");
    }
}
