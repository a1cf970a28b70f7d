//! Lowering of typed TypeScript source trees to Lua syntax trees.
//!
//! # Architecture
//!
//! ```text
//! SourceFile + Resolver ──► TransformationContext ──► visitors ──► lua::File
//!                              │ preceding statements
//!                              │ scopes / hoisting
//!                              └ diagnostics, lualib features
//! ```
//!
//! - [`source`]: the typed input tree, built by a front end or [`SourceBuilder`]
//! - [`resolver`]: type and symbol questions lowering asks the checker
//! - [`context`]: per-file state threaded through every visitor
//! - [`visitors`]: one lowering function per construct, overridable per kind
//! - [`scope`]: scope bookkeeping and the hoisting passes
//! - [`expression_list`]: evaluation-order preservation for expression lists
//!
//! Lowering never fails. Constructs it cannot express produce a diagnostic
//! and a best-effort result, so one bad statement does not hide the rest of
//! the file's diagnostics.

// Typed source tree
pub mod source;
pub use source::SourceFile;

// Checker oracle
pub mod resolver;
pub use resolver::{ContextType, Resolver, SymbolFlags, SymbolTable, TypeFacts};

// Programmatic source construction
pub mod builder;
pub use builder::SourceBuilder;

// Per-file lowering state
pub mod context;
pub use context::TransformationContext;

// Scopes and hoisting
pub mod scope;

// Shared Lua tree helpers
pub mod lua_ast_utils;

// Order-preserving expression lists
pub mod expression_list;

// Construct visitors
pub mod visitors;
pub use visitors::{ExpressionVisitor, StatementVisitor, VisitorChain, VisitorMap};

use tracing::debug;
use tslua_ast as lua;
use tslua_common::{CompilerOptions, Diagnostic};

/// Lowered file and the diagnostics produced on the way.
#[derive(Debug, Clone)]
pub struct TransformResult {
    pub file: lua::File,
    pub diagnostics: Vec<Diagnostic>,
}

/// Lower one file with the standard visitors.
pub fn transform_source_file(
    file: &SourceFile,
    resolver: &dyn Resolver,
    options: &CompilerOptions,
) -> TransformResult {
    transform_source_file_with_visitors(file, resolver, options, &VisitorMap::standard())
}

/// Lower one file, consulting `visitors` for overrides first.
pub fn transform_source_file_with_visitors(
    file: &SourceFile,
    resolver: &dyn Resolver,
    options: &CompilerOptions,
    visitors: &VisitorMap,
) -> TransformResult {
    let _span = tracing::debug_span!("transform_source_file", file = %file.file_name).entered();
    let mut ctx = TransformationContext::new(file, resolver, options, visitors);
    let mut lua_file = visitors::modules::transform_source_file(&mut ctx);
    let (lualib_features, diagnostics) = ctx.into_output();
    lua_file.lualib_features = lualib_features;
    debug!(
        statements = lua_file.statements.len(),
        lualib_features = lua_file.lualib_features.len(),
        diagnostics = diagnostics.len(),
        "lowered file"
    );
    TransformResult {
        file: lua_file,
        diagnostics,
    }
}
