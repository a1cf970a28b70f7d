//! tslua: lowers typed TypeScript syntax trees to Lua source.
//!
//! # Pipeline
//!
//! ```text
//! SourceFile + Resolver ──► tslua_lowering ──► lua::File ──► tslua_printer ──► .lua / .map
//! ```
//!
//! This crate is the facade over the workspace: it runs lowering and
//! printing for one file or many (in parallel), picks output paths, and
//! writes results to disk. Parsing and type checking happen upstream; the
//! front end hands over a [`SourceFile`] and answers [`Resolver`] queries.

pub mod tracing_config;

pub use tslua_ast as lua;
pub use tslua_common::{CompilerOptions, Diagnostic, LuaLibImportKind, LuaTarget};
pub use tslua_lowering::{Resolver, SourceBuilder, SourceFile, SymbolTable};
pub use tslua_printer::PrintResult;

use anyhow::Context;
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use tslua_common::lualib::{EmptyLuaLibProvider, LuaLibCache, LuaLibProvider};
use tslua_printer::LuaPrinter;

/// A source file with the checker answers for it, ready to lower on any thread.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    pub file: SourceFile,
    pub symbols: SymbolTable,
}

/// Output for one source file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranspiledFile {
    pub source_file: String,
    pub lua_file: String,
    pub code: String,
    /// Source map JSON, present when `source_map` is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_map: Option<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl TranspiledFile {
    pub fn source_map_path(&self) -> String {
        format!("{}.map", self.lua_file)
    }
}

pub struct Transpiler {
    options: CompilerOptions,
    lualib: Arc<dyn LuaLibProvider>,
    out_dir: Option<PathBuf>,
}

impl Transpiler {
    pub fn new(options: CompilerOptions) -> Self {
        Transpiler {
            options,
            lualib: Arc::new(EmptyLuaLibProvider),
            out_dir: None,
        }
    }

    /// Source of feature text for `inline` lualib imports.
    pub fn with_lualib_provider(mut self, provider: Arc<dyn LuaLibProvider>) -> Self {
        self.lualib = provider;
        self
    }

    /// Directory outputs are placed under instead of next to their sources.
    pub fn with_out_dir(mut self, out_dir: impl Into<PathBuf>) -> Self {
        self.out_dir = Some(out_dir.into());
        self
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn transpile(&self, file: &SourceFile, resolver: &dyn Resolver) -> TranspiledFile {
        let _span = tracing::debug_span!("transpile", file = %file.file_name).entered();
        let lowered = tslua_lowering::transform_source_file(file, resolver, &self.options);

        let lua_file = lua_output_path(&file.file_name, self.out_dir.as_deref());
        let mut printer = LuaPrinter::new(&self.options, &lua_file, &file.file_name);
        if self.options.lua_lib_import == LuaLibImportKind::Inline {
            let bundle = LuaLibCache::global().get_or_build(self.options.lua_target, self.lualib.as_ref());
            printer = printer.with_lualib_bundle(bundle);
        }
        let printed = printer.print(&lowered.file);

        debug!(
            lua_file = %lua_file,
            diagnostics = lowered.diagnostics.len(),
            "transpiled file"
        );
        TranspiledFile {
            source_file: file.file_name.clone(),
            lua_file,
            code: printed.code,
            source_map: self.options.source_map.then_some(printed.source_map),
            diagnostics: lowered.diagnostics,
        }
    }

    /// Transpile independent files in parallel. Output order matches `units`.
    pub fn transpile_files(&self, units: &[SourceUnit]) -> Vec<TranspiledFile> {
        info!(files = units.len(), lua_target = %self.options.lua_target, "transpiling");
        units
            .par_iter()
            .map(|unit| self.transpile(&unit.file, &unit.symbols))
            .collect()
    }
}

/// Transpile one file with default settings apart from `options`.
pub fn transpile(file: &SourceFile, resolver: &dyn Resolver, options: &CompilerOptions) -> TranspiledFile {
    Transpiler::new(options.clone()).transpile(file, resolver)
}

/// `src/a.ts` becomes `src/a.lua`, or `<out_dir>/src/a.lua` with an output
/// directory. Absolute sources keep only their file name under `out_dir`.
pub fn lua_output_path(source_file: &str, out_dir: Option<&Path>) -> String {
    let source = Path::new(source_file);
    let relative = match out_dir {
        Some(out_dir) if source.is_absolute() => {
            out_dir.join(source.file_name().map(Path::new).unwrap_or(source))
        }
        Some(out_dir) => out_dir.join(source),
        None => source.to_path_buf(),
    };
    relative
        .with_extension("lua")
        .to_string_lossy()
        .replace('\\', "/")
}

/// Write each file's `.lua` output, plus `.lua.map` when it carries a map.
pub fn write_outputs(files: &[TranspiledFile]) -> anyhow::Result<()> {
    for file in files {
        let lua_path = Path::new(&file.lua_file);
        if let Some(parent) = lua_path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create output directory {}", parent.display()))?;
        }
        std::fs::write(lua_path, &file.code)
            .with_context(|| format!("failed to write {}", file.lua_file))?;
        if let Some(source_map) = &file.source_map {
            let map_path = file.source_map_path();
            std::fs::write(&map_path, source_map).with_context(|| format!("failed to write {map_path}"))?;
        }
        debug!(lua_file = %file.lua_file, bytes = file.code.len(), "wrote output");
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/transpile_tests.rs"]
mod transpile_tests;

#[cfg(test)]
#[path = "tests/tracing_config_tests.rs"]
mod tracing_config_tests;
