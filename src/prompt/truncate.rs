//! Bounding diff size before it reaches a backend.

/// Appended to every truncated diff. Begins with a blank-line separator.
pub const TRUNCATION_MARKER: &str = "\n\n[... diff truncated due to size ...]";

/// Bound `diff` to `max_size` characters plus the marker.
///
/// Cuts at the last full line inside the limit when there is one, so the
/// marker always sits on its own line. A diff that already carries the
/// marker within the bound is returned as is, which keeps the function
/// idempotent.
pub fn truncate_diff(diff: &str, max_size: usize) -> String {
    if max_size == 0 {
        return TRUNCATION_MARKER.to_string();
    }

    if diff.chars().count() <= max_size {
        return diff.to_string();
    }

    if let Some(body) = diff.strip_suffix(TRUNCATION_MARKER) {
        if body.chars().count() <= max_size {
            return diff.to_string();
        }
    }

    let end = diff
        .char_indices()
        .nth(max_size)
        .map_or(diff.len(), |(end, _)| end);
    let prefix = &diff[..end];
    if diff[end..].starts_with('\n') {
        return format!("{prefix}{TRUNCATION_MARKER}");
    }

    match prefix.rfind('\n') {
        Some(newline) => format!("{}{TRUNCATION_MARKER}", &prefix[..newline]),
        None => format!("{prefix}{TRUNCATION_MARKER}"),
    }
}
