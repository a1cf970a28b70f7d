//! Lua printer: `lua::File` to source text plus source map.
//!
//! Printing builds a [`SourceNode`] tree first. The text, the v3 source map
//! and the optional traceback table are all derived from that one tree, so
//! they can never disagree about where a chunk ended up.
//!
//! The printer is split by syntax category like the rest of the workspace:
//! - `statements.rs`: statement lists, comments, blocks, function definitions
//! - `expressions.rs`: precedence, literals, calls, tables, expression lists

mod expressions;
mod statements;

use crate::source_map::{build_source_map, relative_source_path, traceback_override};
use crate::source_node::{Chunk, SourceNode};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;
use tslua_ast::{self as lua, Expression, Identifier, Statement};
use tslua_common::limits::INDENT;
use tslua_common::lualib::LuaLibBundle;
use tslua_common::{CompilerOptions, LuaLibFeature, LuaLibImportKind, SourcePosition};

pub const TSLUA_HEADER: &str =
    "--[[ Generated with https://github.com/TypeScriptToLua/TypeScriptToLua ]]\n";

/// Replaced by the traceback registration call once line numbers are known.
pub const SOURCE_MAP_TRACEBACK_PLACEHOLDER: &str = "{#SourceMapTraceback}";

/// Module name required by `require`/`require-minimal` lualib imports.
const LUALIB_MODULE: &str = "lualib_bundle";
const LUALIB_LOCAL: &str = "____lualib";

#[derive(Debug, Clone)]
pub struct PrintResult {
    pub code: String,
    /// Source map as v3 JSON.
    pub source_map: String,
    pub source_map_node: SourceNode,
}

pub struct LuaPrinter<'a> {
    options: &'a CompilerOptions,
    lua_file: String,
    /// Source path relative to the directory of `lua_file`, as written into the map.
    relative_source_path: String,
    lualib: Option<Arc<LuaLibBundle>>,
    current_indent: String,
}

impl<'a> LuaPrinter<'a> {
    pub fn new(options: &'a CompilerOptions, lua_file: &str, source_file: &str) -> Self {
        let lua_file = lua_file.replace('\\', "/");
        let relative_source_path = relative_source_path(&lua_file, source_file);
        LuaPrinter {
            options,
            lua_file,
            relative_source_path,
            lualib: None,
            current_indent: String::new(),
        }
    }

    /// Feature text used for `inline` lualib imports.
    pub fn with_lualib_bundle(mut self, bundle: Arc<LuaLibBundle>) -> Self {
        self.lualib = Some(bundle);
        self
    }

    pub fn relative_source_path(&self) -> &str {
        &self.relative_source_path
    }

    #[tracing::instrument(level = "debug", skip_all, fields(lua_file = %self.lua_file))]
    pub fn print(&mut self, file: &lua::File) -> PrintResult {
        let mut features = file.lualib_features.clone();
        if self.options.source_map_traceback {
            features.insert(LuaLibFeature::SourceMapTraceBack);
        }

        let root = self.print_file(file, &features);
        let source_map = build_source_map(
            &root,
            &self.lua_file,
            &self.relative_source_path,
            self.options.normalized_source_root(),
        );

        let mut code = root.to_string();
        if self.options.inline_source_map {
            code.push('\n');
            code.push_str(&source_map.to_inline_comment());
        }
        if self.options.source_map_traceback {
            code = code.replacen(
                SOURCE_MAP_TRACEBACK_PLACEHOLDER,
                &traceback_override(&root),
                1,
            );
        }

        debug!(
            bytes = code.len(),
            mappings = source_map.mappings().len(),
            "printed lua file"
        );
        PrintResult {
            code,
            source_map: source_map.to_json(),
            source_map_node: root,
        }
    }

    fn print_file(&mut self, file: &lua::File, features: &BTreeSet<LuaLibFeature>) -> SourceNode {
        let mut chunks: Vec<Chunk> = vec![file.trivia.as_str().into()];
        if !self.options.no_header {
            chunks.push(TSLUA_HEADER.into());
        }

        if !features.is_empty() {
            match self.options.lua_lib_import {
                LuaLibImportKind::Require | LuaLibImportKind::RequireMinimal => {
                    let imports = lualib_require_statements(features);
                    chunks.extend(self.print_statement_array(&imports));
                }
                LuaLibImportKind::Inline => {
                    let source = self
                        .lualib
                        .as_deref()
                        .map(|bundle| bundle.inline_source(features.iter().copied()))
                        .unwrap_or_default();
                    chunks.push("-- Lua Library inline imports\n".into());
                    chunks.push(source.into());
                    chunks.push("-- End of Lua Library inline imports\n".into());
                }
                LuaLibImportKind::None => {}
            }
        }

        if self.options.source_map_traceback {
            chunks.push(format!("{SOURCE_MAP_TRACEBACK_PLACEHOLDER}\n").into());
        }

        chunks.extend(self.print_statement_array(&file.statements));
        SourceNode::concat(chunks)
    }

    // =========================================================================
    // Node helpers
    // =========================================================================

    fn source_node(&self, position: Option<SourcePosition>, chunks: Vec<Chunk>) -> SourceNode {
        SourceNode::new(position, None).with_children(chunks)
    }

    fn indent_chunk(&self) -> Chunk {
        Chunk::Text(self.current_indent.clone())
    }

    fn indent(&self, chunk: impl Into<Chunk>) -> SourceNode {
        SourceNode::concat(vec![self.indent_chunk(), chunk.into()])
    }

    fn with_indent<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.current_indent.push_str(INDENT);
        let result = f(self);
        let len = self.current_indent.len() - INDENT.len();
        self.current_indent.truncate(len);
        result
    }

    fn allow_unicode(&self) -> bool {
        self.options.lua_target.allows_unicode_identifiers()
    }
}

fn join_with_comma(nodes: Vec<SourceNode>) -> Vec<Chunk> {
    let mut chunks = Vec::with_capacity(nodes.len() * 2);
    for (index, node) in nodes.into_iter().enumerate() {
        if index > 0 {
            chunks.push(", ".into());
        }
        chunks.push(node.into());
    }
    chunks
}

/// `local ____lualib = require("lualib_bundle")` followed by one local per feature.
fn lualib_require_statements(features: &BTreeSet<LuaLibFeature>) -> Vec<Statement> {
    let mut statements = Vec::with_capacity(features.len() + 1);
    statements.push(Statement::local(
        vec![Identifier::new(LUALIB_LOCAL)],
        vec![Expression::call(
            Expression::identifier("require"),
            vec![Expression::string(LUALIB_MODULE)],
        )],
    ));
    for feature in features {
        let export = feature.export_name();
        statements.push(Statement::local(
            vec![Identifier::new(export.clone())],
            vec![Expression::property(Expression::identifier(LUALIB_LOCAL), export)],
        ));
    }
    statements
}

#[cfg(test)]
#[path = "../../tests/printer.rs"]
mod tests;
