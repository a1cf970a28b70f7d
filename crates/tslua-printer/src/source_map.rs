//! Source map and traceback table construction from a printed node tree.

use crate::source_node::{Chunk, SourceNode};
use std::collections::BTreeMap;
use std::path::Path;
use tslua_common::SourcePosition;
use tslua_common::source_map::{Mapping, SourceMapGenerator};

/// Path of `source_file` relative to the directory containing `lua_file`,
/// with forward slashes. Purely lexical; neither path has to exist.
pub fn relative_source_path(lua_file: &str, source_file: &str) -> String {
    let lua_file = lua_file.replace('\\', "/");
    let source_file = source_file.replace('\\', "/");

    let mut from: Vec<&str> = lua_file
        .split('/')
        .filter(|part| !part.is_empty() && *part != ".")
        .collect();
    from.pop();
    let to: Vec<&str> = source_file
        .split('/')
        .filter(|part| !part.is_empty() && *part != ".")
        .collect();

    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();
    let mut parts: Vec<&str> = vec![".."; from.len() - common];
    parts.extend_from_slice(&to[common..]);
    parts.join("/")
}

struct CurrentMapping {
    generated_line: u32,
    generated_column: u32,
    original: SourcePosition,
    name: Option<String>,
}

struct MapBuilder<'a> {
    generator: SourceMapGenerator,
    source_path: &'a str,
    source_index: Option<u32>,
    line: u32,
    column: u32,
    current: Option<CurrentMapping>,
}

impl MapBuilder<'_> {
    /// Only nodes with a position produce mappings, and only when they point
    /// somewhere new. Unpositioned glue text never creates empty mappings.
    fn is_new_mapping(&self, node: &SourceNode) -> bool {
        let Some(position) = node.position else {
            return false;
        };
        let Some(current) = &self.current else {
            return true;
        };
        if current.generated_line == self.line
            && current.generated_column == self.column
            && current.name == node.name
        {
            return false;
        }
        current.original != position || current.name != node.name
    }

    fn visit(&mut self, node: &SourceNode) {
        if self.is_new_mapping(node)
            && let Some(position) = node.position
        {
            let generator = &mut self.generator;
            let source_path = self.source_path;
            let source_index = *self
                .source_index
                .get_or_insert_with(|| generator.add_source(source_path.to_string()));
            let name_index = node.name.clone().map(|name| self.generator.add_name(name));
            self.generator.add_mapping(Mapping {
                generated_line: self.line,
                generated_column: self.column,
                source_index,
                original_line: position.line,
                original_column: position.column,
                name_index,
            });
            self.current = Some(CurrentMapping {
                generated_line: self.line,
                generated_column: self.column,
                original: position,
                name: node.name.clone(),
            });
        }

        for child in &node.children {
            match child {
                Chunk::Text(text) => self.advance(text),
                Chunk::Node(child) => self.visit(child),
            }
        }
    }

    fn advance(&mut self, text: &str) {
        match memchr::memrchr(b'\n', text.as_bytes()) {
            Some(last_newline) => {
                self.line += memchr::memchr_iter(b'\n', text.as_bytes()).count() as u32;
                // Mappings end at newlines.
                self.current = None;
                self.column = utf16_len(&text[last_newline + 1..]);
            }
            None => self.column += utf16_len(text),
        }
    }
}

fn utf16_len(text: &str) -> u32 {
    if text.is_ascii() {
        text.len() as u32
    } else {
        text.encode_utf16().count() as u32
    }
}

/// Build the v3 map for a printed file. `file` is the basename of `lua_file`.
pub fn build_source_map(
    root: &SourceNode,
    lua_file: &str,
    source_path: &str,
    source_root: String,
) -> SourceMapGenerator {
    let file = Path::new(lua_file)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| lua_file.to_string());
    let mut generator = SourceMapGenerator::new(file);
    generator.set_source_root(source_root);

    let mut builder = MapBuilder {
        generator,
        source_path,
        source_index: None,
        line: 0,
        column: 0,
        current: None,
    };
    builder.visit(root);
    builder.generator
}

/// The `__TS__SourceMapTraceBack` registration call for a printed file.
///
/// Maps each 1-based generated line to the smallest 1-based original line
/// of any positioned chunk printed on it.
pub fn traceback_override(root: &SourceNode) -> String {
    let mut line = 1u32;
    let mut lines: BTreeMap<u32, u32> = BTreeMap::new();
    root.walk(&mut |text, position| {
        if let Some(position) = position {
            let original = position.line + 1;
            lines
                .entry(line)
                .and_modify(|existing| *existing = (*existing).min(original))
                .or_insert(original);
        }
        line += memchr::memchr_iter(b'\n', text.as_bytes()).count() as u32;
    });

    let table = lines
        .iter()
        .map(|(generated, original)| format!("[\"{generated}\"] = {original}"))
        .collect::<Vec<_>>()
        .join(",");
    format!("__TS__SourceMapTraceBack(debug.getinfo(1).short_src, {{{table}}});")
}

#[cfg(test)]
#[path = "../tests/source_map.rs"]
mod tests;
