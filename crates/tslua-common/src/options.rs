//! Compiler options consumed by the lowering passes and the printer.
//!
//! Options are deserialized from the `tstl`-style section of a project
//! config by the (external) driver; field names follow that config in
//! camelCase.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lua dialect the output must run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LuaTarget {
    /// Lowest common denominator of all supported versions.
    #[default]
    #[serde(rename = "universal")]
    Universal,
    #[serde(rename = "5.0")]
    Lua50,
    #[serde(rename = "5.1")]
    Lua51,
    #[serde(rename = "5.2")]
    Lua52,
    #[serde(rename = "5.3")]
    Lua53,
    #[serde(rename = "5.4")]
    Lua54,
    #[serde(rename = "JIT")]
    LuaJit,
}

impl LuaTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            LuaTarget::Universal => "universal",
            LuaTarget::Lua50 => "5.0",
            LuaTarget::Lua51 => "5.1",
            LuaTarget::Lua52 => "5.2",
            LuaTarget::Lua53 => "5.3",
            LuaTarget::Lua54 => "5.4",
            LuaTarget::LuaJit => "JIT",
        }
    }

    /// `goto` and labels exist from 5.2 on (and in LuaJIT).
    pub fn supports_goto(self) -> bool {
        !matches!(
            self,
            LuaTarget::Universal | LuaTarget::Lua50 | LuaTarget::Lua51
        )
    }

    /// Only LuaJIT accepts non-ASCII identifier characters.
    pub fn allows_unicode_identifiers(self) -> bool {
        self == LuaTarget::LuaJit
    }

    /// Targets where `unpack` is a global rather than `table.unpack`.
    pub fn has_global_unpack(self) -> bool {
        matches!(
            self,
            LuaTarget::Lua50 | LuaTarget::Lua51 | LuaTarget::LuaJit
        )
    }
}

impl fmt::Display for LuaTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How runtime library features referenced by a file are made available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LuaLibImportKind {
    /// Nothing is emitted; the host provides the features.
    None,
    /// Feature source is copied into the output file.
    Inline,
    /// `require("lualib_bundle")` plus one local per used feature.
    #[default]
    Require,
    /// Like `Require`, against a bundle containing only used features.
    RequireMinimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompilerOptions {
    pub lua_target: LuaTarget,
    pub lua_lib_import: LuaLibImportKind,
    /// Emit a separate `.map` file next to the output.
    pub source_map: bool,
    /// Append the source map as a base64 data URL comment.
    pub inline_source_map: bool,
    /// Prefix written into the map's `sourceRoot` field.
    pub source_root: Option<String>,
    /// Inject a runtime traceback override mapping Lua lines to source lines.
    pub source_map_traceback: bool,
    /// Omit the generated-by header line.
    pub no_header: bool,
    /// Drop JSDoc comments instead of translating them to LDoc.
    pub remove_comments: bool,
    /// Never create implicit globals for top-level script declarations.
    pub no_implicit_global_variables: bool,
}

impl CompilerOptions {
    /// `sourceRoot` is prepended verbatim by consumers, so it must end in a slash.
    pub fn normalized_source_root(&self) -> String {
        match &self.source_root {
            Some(root) if !root.is_empty() => {
                format!("{}/", root.trim_end_matches(['/', '\\']))
            }
            _ => String::new(),
        }
    }
}

#[cfg(test)]
#[path = "../tests/options.rs"]
mod tests;
