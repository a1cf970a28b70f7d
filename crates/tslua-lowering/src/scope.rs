//! Lexical scopes and declaration hoisting.
//!
//! # Architecture
//!
//! Every lexical region that lowers to its own Lua block pushes a [`Scope`]
//! while its statements are lowered. Lowering records into the scope:
//!
//! - which symbols were referenced, and where (`mark_referenced` records in
//!   every open scope, so outer scopes see inner uses);
//! - `local` declarations created directly in it, by [`StatementId`];
//! - function declarations with the symbols their bodies reference;
//! - lowered import statements.
//!
//! Once the scope's statement list is complete, [`perform_hoisting`] rewrites
//! it into
//!
//! ```text
//! local <hoisted identifiers>
//! <imports>
//! <hoisted function definitions>
//! <remaining statements>
//! ```
//!
//! A symbol is hoisted when the scope is a switch body (case arms share one
//! Lua block), when it is used before its declaration, or when a function
//! defined after its declaration references it and is itself hoisted.
//!
//! Declarations that are not in the list handed to hoisting (they sit in a
//! nested block of a switch case) are skipped.

use crate::context::TransformationContext;
use bitflags::bitflags;
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use tracing::debug;
use tslua_ast::{self as lua, StatementId, SymbolId};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ScopeKind: u16 {
        const FILE = 1 << 0;
        const FUNCTION = 1 << 1;
        const SWITCH = 1 << 2;
        const LOOP = 1 << 3;
        const CONDITIONAL = 1 << 4;
        const BLOCK = 1 << 5;
        const TRY = 1 << 6;
        const CATCH = 1 << 7;
        const LOOP_INITIALIZER = 1 << 8;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableDeclarationInfo {
    pub statement: StatementId,
    pub symbols: SmallVec<[SymbolId; 1]>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionDefinitionInfo {
    /// Statement defining the function once its declaration is lowered.
    pub definition: Option<StatementId>,
    /// Source offset of the declaration.
    pub definition_pos: Option<u32>,
    /// Symbols referenced anywhere inside the function body.
    pub referenced_symbols: FxHashSet<SymbolId>,
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub id: u32,
    pub kind: ScopeKind,
    /// Use-site offsets per symbol.
    pub referenced_symbols: FxHashMap<SymbolId, SmallVec<[u32; 2]>>,
    pub variable_declarations: Vec<VariableDeclarationInfo>,
    pub function_definitions: IndexMap<SymbolId, FunctionDefinitionInfo>,
    pub import_statements: Vec<lua::Statement>,
    /// A `continue` targets this loop.
    pub loop_continued: bool,
    /// A `return` happened inside this try/catch body.
    pub function_returned: bool,
}

impl Scope {
    pub fn new(id: u32, kind: ScopeKind) -> Self {
        Scope {
            id,
            kind,
            referenced_symbols: FxHashMap::default(),
            variable_declarations: Vec::new(),
            function_definitions: IndexMap::new(),
            import_statements: Vec::new(),
            loop_continued: false,
            function_returned: false,
        }
    }

    pub fn reference_count(&self, symbol: SymbolId) -> usize {
        self.referenced_symbols.get(&symbol).map_or(0, |uses| uses.len())
    }

    pub fn add_variable_declaration(&mut self, statement: StatementId, symbols: SmallVec<[SymbolId; 1]>) {
        self.variable_declarations.push(VariableDeclarationInfo { statement, symbols });
    }
}

/// Result of splitting a statement list into what moves and what stays.
#[derive(Debug, Default)]
pub struct HoistedStatements {
    pub statements: Vec<lua::Statement>,
    /// Imports followed by hoisted function definitions.
    pub hoisted_statements: Vec<lua::Statement>,
    pub hoisted_identifiers: Vec<lua::Identifier>,
}

fn find_statement(statements: &[lua::Statement], id: StatementId) -> Option<usize> {
    statements.iter().position(|statement| statement.id == Some(id))
}

fn should_hoist_symbol(ctx: &TransformationContext<'_>, symbol: SymbolId, scope: &Scope) -> bool {
    if scope.kind == ScopeKind::SWITCH {
        return true;
    }
    let Some(info) = ctx.symbol_info(symbol) else {
        return false;
    };
    let Some(declaration_pos) = ctx.resolver.declaration_position(info.symbol) else {
        return false;
    };
    if info.first_seen_at_pos < declaration_pos {
        return true;
    }

    // Only functions defined after the declaration qualify. A function's own
    // declaration position is its definition position, so every step of the
    // recursion moves strictly forward through the file and terminates.
    scope.function_definitions.iter().any(|(function_symbol, definition)| {
        *function_symbol != symbol
            && definition
                .definition_pos
                .is_some_and(|definition_pos| declaration_pos < definition_pos)
            && definition.referenced_symbols.contains(&symbol)
            && should_hoist_symbol(ctx, *function_symbol, scope)
    })
}

fn hoist_function_definitions(
    ctx: &TransformationContext<'_>,
    scope: &Scope,
    statements: &mut Vec<lua::Statement>,
    hoisted_statements: &mut Vec<lua::Statement>,
    hoisted_identifiers: &mut Vec<lua::Identifier>,
) {
    for (symbol, definition) in &scope.function_definitions {
        let Some(definition) = definition.definition else {
            continue;
        };
        if !should_hoist_symbol(ctx, *symbol, scope) {
            continue;
        }
        let Some(index) = find_statement(statements, definition) else {
            continue;
        };
        let statement = statements.remove(index);
        debug!(scope = scope.id, symbol = symbol.0, "hoisting function definition");
        match statement.kind {
            lua::StatementKind::VariableDeclaration { left, right } => {
                let targets = left.iter().cloned().map(lua::Expression::from).collect();
                hoisted_identifiers.extend(left);
                let mut assignment = lua::Statement::assign(targets, right).with_position(statement.position);
                assignment.leading_comments = statement.leading_comments;
                hoisted_statements.push(assignment);
            }
            kind => hoisted_statements.push(lua::Statement { kind, ..statement }),
        }
    }
}

fn hoist_variable_declarations(
    ctx: &TransformationContext<'_>,
    scope: &Scope,
    statements: &mut Vec<lua::Statement>,
    hoisted_identifiers: &mut Vec<lua::Identifier>,
) {
    for declaration in &scope.variable_declarations {
        if !declaration
            .symbols
            .iter()
            .any(|symbol| should_hoist_symbol(ctx, *symbol, scope))
        {
            continue;
        }
        let Some(index) = find_statement(statements, declaration.statement) else {
            continue;
        };
        let lua::StatementKind::VariableDeclaration { left, right } = &statements[index].kind else {
            continue;
        };
        debug!(scope = scope.id, names = ?left.iter().map(|id| &id.text).collect::<Vec<_>>(), "hoisting variable declaration");
        let left = left.clone();
        if right.is_empty() {
            statements.remove(index);
        } else {
            let right = right.clone();
            let original = &statements[index];
            let targets = left.iter().cloned().map(lua::Expression::from).collect();
            let mut assignment = lua::Statement::assign(targets, right).with_position(original.position);
            assignment.leading_comments = original.leading_comments.clone();
            statements[index] = assignment;
        }
        hoisted_identifiers.extend(left);
    }
}

/// Split `statements` of the innermost scope into hoisted and remaining parts.
pub fn separate_hoisted_statements(
    ctx: &mut TransformationContext<'_>,
    mut statements: Vec<lua::Statement>,
) -> HoistedStatements {
    let imports = std::mem::take(&mut ctx.peek_scope_mut().import_statements);

    let ctx = &*ctx;
    let scope = ctx.peek_scope();
    let mut hoisted_statements = Vec::new();
    let mut hoisted_identifiers = Vec::new();
    hoist_function_definitions(
        ctx,
        scope,
        &mut statements,
        &mut hoisted_statements,
        &mut hoisted_identifiers,
    );
    hoist_variable_declarations(ctx, scope, &mut statements, &mut hoisted_identifiers);
    hoisted_statements.splice(0..0, imports);

    HoistedStatements {
        statements,
        hoisted_statements,
        hoisted_identifiers,
    }
}

/// Rewrite the innermost scope's statement list with hoisted parts on top.
pub fn perform_hoisting(ctx: &mut TransformationContext<'_>, statements: Vec<lua::Statement>) -> Vec<lua::Statement> {
    let separated = separate_hoisted_statements(ctx, statements);
    let mut result = Vec::with_capacity(
        separated.hoisted_statements.len() + separated.statements.len() + 1,
    );
    if !separated.hoisted_identifiers.is_empty() {
        result.push(lua::Statement::local(separated.hoisted_identifiers, Vec::new()));
    }
    result.extend(separated.hoisted_statements);
    result.extend(separated.statements);
    result
}

#[cfg(test)]
#[path = "../tests/scope.rs"]
mod tests;
