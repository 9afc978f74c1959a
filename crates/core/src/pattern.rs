//! SQL `LIKE` pattern helpers shared by the services.

/// `%term%` with `LIKE` metacharacters (`\`, `%`, `_`) backslash-escaped,
/// for case-insensitive substring matching with `ILIKE`.
#[must_use]
pub fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_escapes_metacharacters() {
        assert_eq!(contains_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
        assert_eq!(contains_pattern("hat"), "%hat%");
        assert_eq!(contains_pattern(""), "%%");
    }
}
