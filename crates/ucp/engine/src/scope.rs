//! Hierarchical scope names.
//!
//! A scope is a dot-delimited path such as `catalog.offer`. Something bound
//! at `catalog` is visible from `catalog` and from every descendant
//! (`catalog.offer`, `catalog.offer.request`, ...), never from an ancestor.
//! A literal `.` inside a segment cannot be escaped.

/// Wildcard scope; a key bound here is visible from every scope.
pub const ALL_SCOPES: &str = "*";

/// Separator between scope segments.
pub const SCOPE_DELIMITER: char = '.';

/// Whether something registered at `registered` is visible from `requested`.
pub fn scope_matches(registered: &str, requested: &str) -> bool {
    if registered == ALL_SCOPES || registered == requested {
        return true;
    }
    requested
        .strip_prefix(registered)
        .is_some_and(|rest| rest.starts_with(SCOPE_DELIMITER))
}

/// Parent of a scope, or `None` for a top-level scope.
pub fn parent_scope(scope: &str) -> Option<&str> {
    scope.rsplit_once(SCOPE_DELIMITER).map(|(parent, _)| parent)
}
