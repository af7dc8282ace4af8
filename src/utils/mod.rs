pub mod scanner;

/// A bare or double-quoted identifier, optionally qualified up to `db.schema.name`. Bare
/// identifiers may use any Unicode letter.
///
/// Used unanchored inside larger patterns; callers add their own anchors.
pub const QUALIFIED_NAME: &str =
    r#"(?:"[^"]+"|[\p{L}_][\p{L}\p{N}_$]*)(?:\.(?:"[^"]+"|[\p{L}_][\p{L}\p{N}_$]*)){0,2}"#;

/// Collapses every run of whitespace into a single space and trims both ends.
///
/// # Example
///
/// ```
/// use sqldrift::utils::collapse_whitespace;
///
/// assert_eq!(collapse_whitespace("  a =\n\t1 "), "a = 1");
/// ```
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Byte offset of the first non-whitespace character at or after `pos`.
pub fn skip_whitespace(text: &str, pos: usize) -> usize {
    let rest = &text[pos..];
    pos + (rest.len() - rest.trim_start().len())
}

/// Removes one pair of surrounding double quotes.
pub fn unquote(identifier: &str) -> &str {
    identifier
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(identifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_whitespace() {
        assert_eq!(skip_whitespace("a   b", 1), 4);
        assert_eq!(skip_whitespace("ab", 2), 2);
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"Claim Id\""), "Claim Id");
        assert_eq!(unquote("claim_id"), "claim_id");
    }
}
