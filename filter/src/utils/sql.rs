//! SQL text helpers shared by pattern operators

/// Escape SQL LIKE metacharacters (%, _, \) in user input
///
/// PostgreSQL and DuckDB both treat backslash as the default LIKE escape
/// character, so the escaped text can be bound as-is.
///
/// # Example
///
/// ```
/// use rowfilter::utils::sql::escape_like_pattern;
///
/// let pattern = format!("%{}%", escape_like_pattern("100% match_test"));
/// assert_eq!(pattern, "%100\\% match\\_test%");
/// ```
pub fn escape_like_pattern(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Where the literal text must appear inside a LIKE pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikePosition {
    Anywhere,
    Prefix,
    Suffix,
}

/// Build a LIKE pattern that matches `text` literally at the given position
pub fn like_pattern(text: &str, position: LikePosition) -> String {
    let escaped = escape_like_pattern(text);
    match position {
        LikePosition::Anywhere => format!("%{}%", escaped),
        LikePosition::Prefix => format!("{}%", escaped),
        LikePosition::Suffix => format!("%{}", escaped),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like_pattern_no_special_chars() {
        assert_eq!(escape_like_pattern("hello"), "hello");
    }

    #[test]
    fn test_escape_like_pattern_multiple() {
        assert_eq!(escape_like_pattern("100%_\\test"), "100\\%\\_\\\\test");
    }

    #[test]
    fn test_escape_like_pattern_empty() {
        assert_eq!(escape_like_pattern(""), "");
    }

    #[test]
    fn test_like_pattern_positions() {
        assert_eq!(like_pattern("ab", LikePosition::Anywhere), "%ab%");
        assert_eq!(like_pattern("ab", LikePosition::Prefix), "ab%");
        assert_eq!(like_pattern("ab", LikePosition::Suffix), "%ab");
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("5%", LikePosition::Prefix), "5\\%%");
        assert_eq!(like_pattern("a_b", LikePosition::Suffix), "%a\\_b");
    }
}
