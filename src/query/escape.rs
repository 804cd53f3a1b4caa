//! Escaping of user values embedded in index queries.

/// Characters with a special meaning in the index query syntax.
const SPECIAL_CHARS: &[char] = &[
    '\\', '+', '-', '!', '(', ')', ':', '^', '[', ']', '"', '{', '}', '~', '*', '?', '|', '&',
    ';', '/',
];

/// Escape every special character and whitespace with a backslash.
///
/// Use this for values placed unquoted in a query (e.g. before a `.*`
/// wildcard suffix).
pub fn escape_query_chars(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        if SPECIAL_CHARS.contains(&c) || c.is_whitespace() {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Escape a value for use inside a double-quoted phrase.
pub fn escape_phrase(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Wrap a value in double quotes, escaping embedded quotes.
pub fn quote(value: &str) -> String {
    format!("\"{}\"", escape_phrase(value))
}

/// Remove backslash escapes.
pub fn unescape_query_chars(value: &str) -> String {
    let mut unescaped = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                unescaped.push(next);
            }
        } else {
            unescaped.push(c);
        }
    }
    unescaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_query_chars() {
        assert_eq!(escape_query_chars("science.biology"), "science.biology");
        assert_eq!(escape_query_chars("a b"), "a\\ b");
        assert_eq!(escape_query_chars("x:(y)"), "x\\:\\(y\\)");
        assert_eq!(escape_query_chars("1/2"), "1\\/2");
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote("science.biology"), "\"science.biology\"");
        assert_eq!(quote("say \"hi\""), "\"say \\\"hi\\\"\"");
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape_query_chars(&escape_query_chars("a b:(c)")), "a b:(c)");
    }
}
