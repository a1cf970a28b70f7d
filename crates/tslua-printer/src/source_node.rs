//! Printed output as a tree of text chunks annotated with source positions.
//!
//! The printer never writes into a flat buffer directly. Every construct
//! becomes a [`SourceNode`] whose children are text or nested nodes, and the
//! node carries the position of the source construct it came from (if any).
//! Flattening the tree gives the code; walking it with a running
//! line/column gives the source map and the traceback table.

use std::fmt;
use tslua_common::SourcePosition;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    Text(String),
    Node(SourceNode),
}

impl From<&str> for Chunk {
    fn from(text: &str) -> Self {
        Chunk::Text(text.to_string())
    }
}

impl From<String> for Chunk {
    fn from(text: String) -> Self {
        Chunk::Text(text)
    }
}

impl From<SourceNode> for Chunk {
    fn from(node: SourceNode) -> Self {
        Chunk::Node(node)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceNode {
    /// Origin of this chunk; `None` for glue text that maps nowhere.
    pub position: Option<SourcePosition>,
    /// Source name recorded in the map's `names` for renamed identifiers.
    pub name: Option<String>,
    pub children: Vec<Chunk>,
}

impl SourceNode {
    pub fn new(position: Option<SourcePosition>, name: Option<String>) -> Self {
        SourceNode {
            position,
            name,
            children: Vec::new(),
        }
    }

    /// Unmapped node grouping `chunks`.
    pub fn concat(chunks: Vec<Chunk>) -> Self {
        SourceNode {
            position: None,
            name: None,
            children: chunks,
        }
    }

    pub fn with_children(mut self, chunks: Vec<Chunk>) -> Self {
        self.children = chunks;
        self
    }

    pub fn add(&mut self, chunk: impl Into<Chunk>) {
        self.children.push(chunk.into());
    }

    pub fn extend(&mut self, chunks: impl IntoIterator<Item = Chunk>) {
        self.children.extend(chunks);
    }

    /// Visit every text chunk in output order with the position of the node
    /// that directly contains it.
    pub fn walk(&self, visit: &mut impl FnMut(&str, Option<SourcePosition>)) {
        for child in &self.children {
            match child {
                Chunk::Text(text) => visit(text, self.position),
                Chunk::Node(node) => node.walk(visit),
            }
        }
    }

    pub fn first_non_blank_char(&self) -> Option<char> {
        let mut result = None;
        self.walk(&mut |text, _| {
            if result.is_none() {
                result = text.trim_start().chars().next();
            }
        });
        result
    }

    /// Whether the first non-blank output character is `(`.
    pub fn starts_with_parenthesis(&self) -> bool {
        self.first_non_blank_char() == Some('(')
    }

    pub fn write_to(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Chunk::Text(text) => out.push_str(text),
                Chunk::Node(node) => node.write_to(out),
            }
        }
    }
}

impl fmt::Display for SourceNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.write_to(&mut out);
        f.write_str(&out)
    }
}

#[cfg(test)]
#[path = "../tests/source_node.rs"]
mod tests;
