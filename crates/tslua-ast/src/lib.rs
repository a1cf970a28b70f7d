//! Lua syntax tree for the tslua compiler backend.
//!
//! # Architecture
//!
//! Lowering passes build this tree; the printer serializes it. The tree is
//! strictly owned: every node exclusively owns its children, there are no
//! back-pointers and no sharing, so `Clone` is a deep copy.
//!
//! Each node optionally carries the [`SourcePosition`] of the source
//! construct it was lowered from. Nodes without a position are synthetic and
//! never anchor a source map mapping.
//!
//! [`SourcePosition`]: tslua_common::SourcePosition

pub mod node;
pub use node::*;

pub mod operators;
pub use operators::{BinaryOperator, UnaryOperator};

pub mod names;
