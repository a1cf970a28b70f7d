//! Lua printer for the tslua compiler backend.
//!
//! Turns a [`tslua_ast::File`] into Lua source text, a v3 source map and
//! (optionally) an inline map comment and runtime traceback table.
//!
//! ```text
//! lua::File ──► LuaPrinter ──► SourceNode tree ──┬─► code
//!                                                ├─► source map JSON
//!                                                └─► traceback table
//! ```
//!
//! Printing never fails: the tree is assumed well formed and any shape the
//! lowering passes can build has a textual form.

mod escape;
pub use escape::escape_string;

pub mod source_node;
pub use source_node::{Chunk, SourceNode};

mod printer;
pub use printer::{LuaPrinter, PrintResult, SOURCE_MAP_TRACEBACK_PLACEHOLDER, TSLUA_HEADER};

pub mod source_map;

use tslua_common::CompilerOptions;

/// Print `file`, the lowering of `source_file`, as the contents of `lua_file`.
pub fn print(file: &tslua_ast::File, options: &CompilerOptions, lua_file: &str, source_file: &str) -> PrintResult {
    LuaPrinter::new(options, lua_file, source_file).print(file)
}
