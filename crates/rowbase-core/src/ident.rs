//! SQL identifier quoting.
//!
//! Table names arrive as arbitrary caller strings, so every identifier that
//! reaches the backend goes through this helper.

/// Quote a SQL identifier using ANSI double-quoting.
///
/// Embedded double-quotes are escaped by doubling them (`"` → `""`), which
/// makes the result safe against SQL injection for any input string.
///
/// # Examples
///
/// ```
/// use rowbase_core::quote_ident;
///
/// assert_eq!(quote_ident("people"), "\"people\"");
/// assert_eq!(quote_ident("odd\"name"), "\"odd\"\"name\"");
/// assert_eq!(quote_ident("select"), "\"select\""); // SQL keyword
/// ```
#[inline]
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_simple() {
        assert_eq!(quote_ident("people"), "\"people\"");
    }

    #[test]
    fn quote_escapes_embedded_quotes() {
        assert_eq!(quote_ident("a\"b\"c"), "\"a\"\"b\"\"c\"");
    }

    #[test]
    fn quote_keyword_and_spaces() {
        assert_eq!(quote_ident("from"), "\"from\"");
        assert_eq!(quote_ident("first name"), "\"first name\"");
    }

    #[test]
    fn quote_injection_attempt_stays_inert() {
        let quoted = quote_ident("t\"; DROP TABLE secrets; --");
        assert_eq!(quoted, "\"t\"\"; DROP TABLE secrets; --\"");
    }
}
