//! Lua identifier rules and safe-name generation.

/// Reserved words of Lua 5.0 - 5.4.
pub fn is_lua_keyword(name: &str) -> bool {
    matches!(
        name,
        "and"
            | "break"
            | "do"
            | "else"
            | "elseif"
            | "end"
            | "false"
            | "for"
            | "function"
            | "goto"
            | "if"
            | "in"
            | "local"
            | "nil"
            | "not"
            | "or"
            | "repeat"
            | "return"
            | "then"
            | "true"
            | "until"
            | "while"
    )
}

/// Globals that a local of the same name would shadow for generated code.
pub fn is_lua_builtin(name: &str) -> bool {
    matches!(
        name,
        "_G" | "assert"
            | "coroutine"
            | "debug"
            | "error"
            | "ipairs"
            | "math"
            | "pairs"
            | "pcall"
            | "print"
            | "rawget"
            | "repeat"
            | "require"
            | "self"
            | "string"
            | "table"
            | "tostring"
            | "type"
            | "unpack"
    )
}

fn is_unicode_identifier_char(c: char) -> bool {
    ('\u{7F}'..='\u{FFFD}').contains(&c)
}

/// Whether `name` can be used verbatim as a Lua name.
pub fn is_valid_lua_identifier(name: &str, allow_unicode: bool) -> bool {
    if is_lua_keyword(name) {
        return false;
    }
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    let start_ok = first.is_ascii_alphabetic()
        || first == '_'
        || (allow_unicode && is_unicode_identifier_char(first));
    start_ok
        && chars.all(|c| {
            c.is_ascii_alphanumeric() || c == '_' || (allow_unicode && is_unicode_identifier_char(c))
        })
}

/// Whether `name` may follow `function` in declaration syntax.
///
/// `foo.bar` passes (`function foo.bar()` is valid), `getFoo().bar` does not.
pub fn is_valid_function_declaration_name(name: &str, allow_unicode: bool) -> bool {
    !name.is_empty()
        && name.chars().all(|c| {
            c.is_ascii_alphanumeric()
                || c == '_'
                || c == '.'
                || (allow_unicode && ('\u{FF}'..='\u{FFFD}').contains(&c))
        })
}

/// Names that must be renamed when declared as locals.
pub fn is_unsafe_name(name: &str, allow_unicode: bool) -> bool {
    !is_valid_lua_identifier(name, allow_unicode) || is_lua_builtin(name)
}

/// Replace every character outside `[a-zA-Z0-9_]` with `_` plus its hex code.
pub fn fix_invalid_lua_identifier(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            out.push(c);
        } else {
            out.push('_');
            out.push_str(&format!("{:X}", c as u32));
        }
    }
    out
}

/// Prefix a sanitized name so it cannot clash with user identifiers.
pub fn create_safe_name(name: &str) -> String {
    format!("____{}", fix_invalid_lua_identifier(name))
}

#[cfg(test)]
#[path = "../tests/names.rs"]
mod tests;
