//! Lua string literal escaping.

/// Quote `value` as a double-quoted Lua string literal.
///
/// Only the characters that would break the literal or change meaning are
/// escaped; everything else, including non-ASCII text, is copied as is.
pub fn escape_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    let mut chars = value.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{b}' => out.push_str("\\v"),
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            // `\0` followed by a digit would read as a longer decimal escape.
            '\0' if chars.peek().is_some_and(char::is_ascii_digit) => out.push_str("\\000"),
            '\0' => out.push_str("\\0"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
#[path = "../tests/escape.rs"]
mod tests;
