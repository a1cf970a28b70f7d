use super::*;

/// Decode a literal produced by `escape_string` the way Lua reads it.
fn unescape(literal: &str) -> String {
    let inner = literal
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .expect("literal is quoted");
    let mut out = String::new();
    let mut chars = inner.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next().expect("escape has a character") {
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\u{b}'),
            '\\' => out.push('\\'),
            '"' => out.push('"'),
            digit if digit.is_ascii_digit() => {
                // Up to three decimal digits.
                let mut code = digit.to_digit(10).unwrap();
                for _ in 0..2 {
                    match chars.peek().and_then(|next| next.to_digit(10)) {
                        Some(next) => {
                            code = code * 10 + next;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(code).unwrap());
            }
            other => panic!("unexpected escape \\{other}"),
        }
    }
    out
}

#[test]
fn test_plain_text_is_quoted() {
    assert_eq!(escape_string("hello"), "\"hello\"");
    assert_eq!(escape_string(""), "\"\"");
    assert_eq!(escape_string("héllo ✓"), "\"héllo ✓\"");
}

#[test]
fn test_control_characters_are_escaped() {
    assert_eq!(escape_string("a\nb"), "\"a\\nb\"");
    assert_eq!(escape_string("\t\r"), "\"\\t\\r\"");
    assert_eq!(escape_string("\u{8}\u{c}\u{b}"), "\"\\b\\f\\v\"");
    assert_eq!(escape_string("say \"hi\""), "\"say \\\"hi\\\"\"");
    assert_eq!(escape_string("C:\\dir"), "\"C:\\\\dir\"");
}

#[test]
fn test_nul_before_digit_uses_long_form() {
    assert_eq!(escape_string("\0"), "\"\\0\"");
    assert_eq!(escape_string("\0x"), "\"\\0x\"");
    assert_eq!(escape_string("\01"), "\"\\0001\"");
}

#[test]
fn test_escaping_round_trips() {
    for value in [
        "",
        "plain",
        "line\nbreak",
        "quote\" and \\ backslash",
        "\0\0\0",
        "\07",
        "tab\tvt\u{b}ff\u{c}bs\u{8}cr\r",
        "unicode: 日本語",
    ] {
        assert_eq!(unescape(&escape_string(value)), value, "round trip of {value:?}");
    }
}
