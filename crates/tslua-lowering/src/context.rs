//! Per-file lowering state.
//!
//! # Architecture
//!
//! One [`TransformationContext`] exists per source file and is threaded by
//! `&mut` through every visitor. It owns:
//!
//! - the **preceding-statements stack**: statements an expression needs to run
//!   before the statement that contains it. [`TransformationContext::run_in_new_frame`]
//!   pushes a frame, runs a closure and returns whatever the closure added;
//!   [`TransformationContext::transform_statements`] gives every source statement
//!   its own frame and splices it directly before that statement's output.
//! - the **scope stack** used by hoisting (see [`crate::scope`]).
//! - symbol tracking: binder symbols are numbered on first sight, and the
//!   position of that first sight is what hoisting compares against the
//!   declaration position.
//! - temp naming, diagnostics and the set of runtime library features used.
//!
//! Nothing here is shared between files; files can be lowered in parallel
//! with one context each.

use crate::resolver::Resolver;
use crate::scope::{Scope, ScopeKind};
use crate::source::{Ident, NodeId, SourceFile, SourceSymbol, Statement, SyntaxKind};
use crate::visitors::{VisitorChain, VisitorMap};
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use tracing::trace;
use tslua_ast as lua;
use tslua_ast::names::create_safe_name;
use tslua_common::diagnostics::{DiagnosticMessage, diagnostic_messages};
use tslua_common::limits::MAX_LOWERING_DEPTH;
use tslua_common::{CompilerOptions, Diagnostic, LineMap, LuaLibFeature, LuaTarget, SourcePosition};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolInfo {
    pub symbol: SourceSymbol,
    /// Offset of the first identifier lowered for this symbol.
    pub first_seen_at_pos: u32,
}

/// The non-nil left side of the optional chain being lowered.
#[derive(Debug, Clone)]
pub struct OptionalContinuation {
    pub value: lua::Identifier,
    /// Object the value was read from, passed as `self` when the
    /// continuation calls the value itself (`obj.m?.()`).
    pub this_value: Option<lua::Expression>,
}

pub struct TransformationContext<'a> {
    pub options: &'a CompilerOptions,
    pub resolver: &'a dyn Resolver,
    pub file: &'a SourceFile,
    pub lua_target: LuaTarget,
    pub is_module: bool,
    visitors: &'a VisitorMap,
    line_map: LineMap,
    diagnostics: Vec<Diagnostic>,
    preceding_statements_stack: Vec<Vec<lua::Statement>>,
    scope_stack: Vec<Scope>,
    last_scope_id: u32,
    next_temp_id: u32,
    last_symbol_id: u32,
    last_statement_id: u32,
    symbol_ids: FxHashMap<SourceSymbol, lua::SymbolId>,
    symbol_info: FxHashMap<lua::SymbolId, SymbolInfo>,
    used_lualib_features: BTreeSet<LuaLibFeature>,
    optional_continuations: Vec<OptionalContinuation>,
    depth: u32,
}

impl<'a> TransformationContext<'a> {
    pub fn new(
        file: &'a SourceFile,
        resolver: &'a dyn Resolver,
        options: &'a CompilerOptions,
        visitors: &'a VisitorMap,
    ) -> Self {
        TransformationContext {
            options,
            resolver,
            file,
            lua_target: options.lua_target,
            is_module: file.is_module,
            visitors,
            line_map: LineMap::build(&file.text),
            diagnostics: Vec::new(),
            preceding_statements_stack: Vec::new(),
            scope_stack: Vec::new(),
            last_scope_id: 0,
            next_temp_id: 0,
            last_symbol_id: 0,
            last_statement_id: 0,
            symbol_ids: FxHashMap::default(),
            symbol_info: FxHashMap::default(),
            used_lualib_features: BTreeSet::new(),
            optional_continuations: Vec::new(),
            depth: 0,
        }
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    pub fn transform_expression(&mut self, expression: &crate::source::Expression) -> lua::Expression {
        let chain = self.visitors.expression_chain(expression.syntax_kind());
        self.run_expression_visitor(expression, chain)
    }

    /// Continue with the handler registered before the one holding `chain`.
    pub fn super_transform_expression(
        &mut self,
        expression: &crate::source::Expression,
        chain: VisitorChain,
    ) -> lua::Expression {
        self.run_expression_visitor(expression, chain.previous())
    }

    fn run_expression_visitor(
        &mut self,
        expression: &crate::source::Expression,
        chain: VisitorChain,
    ) -> lua::Expression {
        if self.depth >= MAX_LOWERING_DEPTH {
            self.diagnose(
                expression.pos,
                &diagnostic_messages::UNSUPPORTED_NODE_KIND,
                &["deeply nested expression"],
            );
            return lua::Expression::nil();
        }
        let visitors = self.visitors;
        let visitor = visitors.expression_visitor(chain);
        self.depth += 1;
        let result = visitor(self, expression, chain);
        self.depth -= 1;
        result
    }

    pub fn transform_statement(&mut self, statement: &Statement) -> Vec<lua::Statement> {
        if is_ambient(statement) {
            return Vec::new();
        }
        let chain = self.visitors.statement_chain(statement.syntax_kind());
        self.run_statement_visitor(statement, chain)
    }

    pub fn super_transform_statement(&mut self, statement: &Statement, chain: VisitorChain) -> Vec<lua::Statement> {
        self.run_statement_visitor(statement, chain.previous())
    }

    fn run_statement_visitor(&mut self, statement: &Statement, chain: VisitorChain) -> Vec<lua::Statement> {
        if self.depth >= MAX_LOWERING_DEPTH {
            self.diagnose(
                statement.pos,
                &diagnostic_messages::UNSUPPORTED_NODE_KIND,
                &["deeply nested statement"],
            );
            return Vec::new();
        }
        let visitors = self.visitors;
        let visitor = visitors.statement_visitor(chain);
        self.depth += 1;
        let result = visitor(self, statement, chain);
        self.depth -= 1;
        result
    }

    /// Lower a statement list, splicing each statement's preceding statements
    /// directly in front of it.
    pub fn transform_statements(&mut self, statements: &[Statement]) -> Vec<lua::Statement> {
        let mut result = Vec::with_capacity(statements.len());
        for statement in statements {
            let (mut preceding, lowered) = self.run_in_new_frame(|ctx| ctx.transform_statement(statement));
            result.append(&mut preceding);
            result.extend(lowered);
        }
        result
    }

    // =========================================================================
    // Preceding statements
    // =========================================================================

    pub fn run_in_new_frame<T>(&mut self, body: impl FnOnce(&mut Self) -> T) -> (Vec<lua::Statement>, T) {
        self.preceding_statements_stack.push(Vec::new());
        let result = body(self);
        let statements = self
            .preceding_statements_stack
            .pop()
            .expect("preceding statements frame was popped by someone else");
        (statements, result)
    }

    fn active_frame(&mut self) -> &mut Vec<lua::Statement> {
        self.preceding_statements_stack
            .last_mut()
            .expect("no active preceding statements frame")
    }

    pub fn add_preceding_statement(&mut self, statement: lua::Statement) {
        self.active_frame().push(statement);
    }

    pub fn add_preceding_statements(&mut self, statements: impl IntoIterator<Item = lua::Statement>) {
        self.active_frame().extend(statements);
    }

    pub fn prepend_preceding_statements(&mut self, statements: Vec<lua::Statement>) {
        let frame = self.active_frame();
        frame.splice(0..0, statements);
    }

    // =========================================================================
    // Scopes
    // =========================================================================

    pub fn push_scope(&mut self, kind: ScopeKind) -> &mut Scope {
        self.last_scope_id += 1;
        trace!(id = self.last_scope_id, ?kind, "push scope");
        self.scope_stack.push(Scope::new(self.last_scope_id, kind));
        self.scope_stack.last_mut().expect("scope was just pushed")
    }

    pub fn pop_scope(&mut self) -> Scope {
        self.scope_stack.pop().expect("pop_scope called with no open scope")
    }

    pub fn peek_scope(&self) -> &Scope {
        self.scope_stack.last().expect("peek_scope called with no open scope")
    }

    pub fn peek_scope_mut(&mut self) -> &mut Scope {
        self.scope_stack.last_mut().expect("peek_scope called with no open scope")
    }

    /// Innermost open scope whose kind intersects `mask`.
    pub fn find_scope(&self, mask: ScopeKind) -> Option<&Scope> {
        self.scope_stack.iter().rev().find(|scope| scope.kind.intersects(mask))
    }

    pub fn find_scope_mut(&mut self, mask: ScopeKind) -> Option<&mut Scope> {
        self.scope_stack.iter_mut().rev().find(|scope| scope.kind.intersects(mask))
    }

    /// Flag every scope up to the enclosing function as returned from.
    ///
    /// Returns whether a try or catch body lies in between, in which case the
    /// return has to travel out of a `pcall` callback.
    pub fn mark_function_returned(&mut self) -> bool {
        let mut inside_try_catch = false;
        for scope in self.scope_stack.iter_mut().rev() {
            scope.function_returned = true;
            if scope.kind == ScopeKind::FUNCTION {
                break;
            }
            inside_try_catch |= scope.kind.intersects(ScopeKind::TRY | ScopeKind::CATCH);
        }
        inside_try_catch
    }

    pub fn scope_depth(&self) -> usize {
        self.scope_stack.len()
    }

    /// Record a use of `symbol` at `pos` in every open scope.
    ///
    /// Outer scopes need inner references too: a function hoisted at file
    /// level may be the one using a variable declared later at file level.
    pub fn mark_referenced(&mut self, symbol: lua::SymbolId, pos: u32) {
        for scope in &mut self.scope_stack {
            scope.referenced_symbols.entry(symbol).or_default().push(pos);
        }
    }

    // =========================================================================
    // Symbols
    // =========================================================================

    pub fn next_symbol_id(&mut self) -> lua::SymbolId {
        self.last_symbol_id += 1;
        lua::SymbolId(self.last_symbol_id)
    }

    /// Number a binder symbol on first sight and record the use.
    pub fn identifier_symbol_id(&mut self, ident: &Ident) -> Option<lua::SymbolId> {
        let symbol = ident.symbol?;
        let id = match self.symbol_ids.get(&symbol) {
            Some(id) => *id,
            None => {
                let id = self.next_symbol_id();
                self.symbol_ids.insert(symbol, id);
                self.symbol_info.insert(
                    id,
                    SymbolInfo {
                        symbol,
                        first_seen_at_pos: ident.pos,
                    },
                );
                id
            }
        };
        self.mark_referenced(id, ident.pos);
        Some(id)
    }

    /// Lowered id of a binder symbol seen before, without recording a use.
    pub fn known_symbol_id(&self, symbol: SourceSymbol) -> Option<lua::SymbolId> {
        self.symbol_ids.get(&symbol).copied()
    }

    pub fn symbol_info(&self, symbol: lua::SymbolId) -> Option<&SymbolInfo> {
        self.symbol_info.get(&symbol)
    }

    pub fn next_statement_id(&mut self) -> lua::StatementId {
        self.last_statement_id += 1;
        lua::StatementId(self.last_statement_id)
    }

    // =========================================================================
    // Optional chains
    // =========================================================================

    pub fn run_with_optional_continuation<T>(
        &mut self,
        continuation: OptionalContinuation,
        body: impl FnOnce(&mut Self) -> T,
    ) -> T {
        self.optional_continuations.push(continuation);
        let result = body(self);
        self.optional_continuations.pop();
        result
    }

    pub fn optional_continuation(&self) -> Option<&OptionalContinuation> {
        self.optional_continuations.last()
    }

    // =========================================================================
    // Temps
    // =========================================================================

    /// Fresh `____<hint>_<n>` name; never reused within the file.
    pub fn create_temp_name(&mut self, hint: Option<&str>) -> String {
        let hint = hint.unwrap_or("temp").trim_start_matches('_');
        let name = create_safe_name(&format!("{hint}_{}", self.next_temp_id));
        self.next_temp_id += 1;
        name
    }

    pub fn create_temp_for_lua_expression(&mut self, expression: &lua::Expression) -> lua::Identifier {
        let hint = temp_hint_for_lua_expression(expression);
        let name = self.create_temp_name(hint.as_deref());
        lua::Identifier::temp(name).with_position(expression.position)
    }

    // =========================================================================
    // Output bookkeeping
    // =========================================================================

    pub fn position(&self, pos: u32) -> Option<SourcePosition> {
        Some(self.line_map.offset_to_position(pos, &self.file.text))
    }

    pub fn diagnose(&mut self, pos: u32, message: &DiagnosticMessage, args: &[&str]) {
        self.diagnostics.push(Diagnostic::from_message(
            self.file.file_name.clone(),
            pos,
            1,
            message,
            args,
        ));
    }

    pub fn diagnose_unsupported_kind(&mut self, pos: u32, kind: SyntaxKind) {
        let kind = kind.to_string();
        self.diagnose(pos, &diagnostic_messages::UNSUPPORTED_NODE_KIND, &[&kind]);
    }

    pub fn diagnose_unsupported_for_target(&mut self, pos: u32, functionality: &str) {
        let target = match self.lua_target {
            LuaTarget::LuaJit => "LuaJIT".to_string(),
            target => format!("Lua {target}"),
        };
        self.diagnose(pos, &diagnostic_messages::UNSUPPORTED_FOR_TARGET, &[functionality, &target]);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn use_lualib(&mut self, feature: LuaLibFeature) {
        self.used_lualib_features.insert(feature);
    }

    /// `__TS__<Feature>(args)`, recording the feature as used.
    pub fn lualib_call(
        &mut self,
        feature: LuaLibFeature,
        params: Vec<lua::Expression>,
        position: Option<SourcePosition>,
    ) -> lua::Expression {
        self.use_lualib(feature);
        lua::Expression::call(lua::Expression::identifier(feature.export_name()), params).with_position(position)
    }

    pub fn into_output(self) -> (BTreeSet<LuaLibFeature>, Vec<Diagnostic>) {
        (self.used_lualib_features, self.diagnostics)
    }

    /// Type facts for a source node.
    pub fn type_facts(&self, node: NodeId) -> crate::resolver::TypeFacts {
        self.resolver.type_facts(node)
    }
}

fn is_ambient(statement: &Statement) -> bool {
    use crate::source::StatementKind;
    match &statement.kind {
        StatementKind::Variable { modifiers, .. } | StatementKind::Function { modifiers, .. } => modifiers.declare,
        _ => false,
    }
}

/// Readable temp hint derived from the expression a temp will hold.
fn temp_hint_for_lua_expression(expression: &lua::Expression) -> Option<String> {
    match &expression.kind {
        lua::ExpressionKind::String(value) => Some(value.clone()),
        lua::ExpressionKind::Numeric(value) => Some(format!("_{}", format_js_number(*value))),
        lua::ExpressionKind::Identifier(identifier) => Some(identifier.text.clone()),
        lua::ExpressionKind::Call { expression, .. } => {
            temp_hint_for_lua_expression(expression).map(|name| format!("{name}_result"))
        }
        lua::ExpressionKind::TableIndex { table, index } => {
            let table = temp_hint_for_lua_expression(table);
            let index = temp_hint_for_lua_expression(index);
            if table.is_none() && index.is_none() {
                return None;
            }
            Some(format!(
                "{}_{}",
                table.as_deref().unwrap_or("table"),
                index.as_deref().unwrap_or("index")
            ))
        }
        _ => None,
    }
}

/// Integral values print without a fraction, like the source language does.
pub(crate) fn format_js_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
#[path = "../tests/context.rs"]
mod tests;
