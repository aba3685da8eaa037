//! Small string helpers shared by the pipeline stages.

/// Returns the prefix of `s` holding at most `max` characters.
///
/// Counts characters rather than bytes so multi-byte text is never split.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Like [`truncate_chars`] but appends `...` when something was cut.
pub fn truncate_with_ellipsis(s: &str, max: usize) -> String {
    let prefix = truncate_chars(s, max);
    if prefix.len() < s.len() { format!("{}...", prefix) } else { s.to_string() }
}

/// Collapses whitespace runs to a single space and trims both ends.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
