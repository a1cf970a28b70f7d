//! Common types and utilities for the tslua compiler backend.
//!
//! This crate provides foundational types used across all tslua crates:
//! - Source positions and line maps (`SourcePosition`, `LineMap`)
//! - Non-fatal, position-attributed diagnostics
//! - Compiler options (`LuaTarget`, `LuaLibImportKind`, `CompilerOptions`)
//! - Runtime library feature identifiers and the shared per-target bundle cache
//! - Source map generation (VLQ, base64, v3 JSON)
//! - Lowering limits and thresholds

// Position types for line/column source locations
pub mod position;
pub use position::{LineMap, SourcePosition};

// Diagnostics reported while lowering
pub mod diagnostics;
pub use diagnostics::{Diagnostic, DiagnosticCategory};

// Compiler options
pub mod options;
pub use options::{CompilerOptions, LuaLibImportKind, LuaTarget};

// Runtime library features
pub mod lualib;
pub use lualib::LuaLibFeature;

// Source Map generation
pub mod source_map;

// Centralized limits and thresholds
pub mod limits;
