//! Lua tree helpers shared by the visitors.

use crate::context::TransformationContext;
use crate::scope::ScopeKind;
use smallvec::SmallVec;
use tslua_ast::{self as lua, BinaryOperator, UnaryOperator};
use tslua_common::{LuaLibFeature, LuaTarget, SourcePosition};

pub const EXPORTS_NAME: &str = "____exports";

pub fn create_exports_identifier() -> lua::Expression {
    lua::Expression::identifier(EXPORTS_NAME)
}

/// `____exports.<name>`
pub fn create_exported_identifier(identifier: &lua::Identifier) -> lua::Expression {
    lua::Expression::property(create_exports_identifier(), identifier.text.clone()).with_position(identifier.position)
}

/// `self`, the implicit context parameter.
pub fn create_self_identifier() -> lua::Identifier {
    lua::Identifier::new("self").with_original_name("this")
}

/// Whether a lowered identifier names a symbol exported from this module.
pub fn is_exported_identifier(ctx: &TransformationContext<'_>, identifier: &lua::Identifier) -> bool {
    if !ctx.is_module {
        return false;
    }
    identifier
        .symbol_id
        .and_then(|id| ctx.symbol_info(id))
        .is_some_and(|info| ctx.resolver.is_exported(info.symbol))
}

/// `expression + change`, folding literals and `x - change`.
pub fn add_to_numeric_expression(expression: lua::Expression, change: f64) -> lua::Expression {
    if change == 0.0 {
        return expression;
    }
    if let Some(value) = expression.number_value() {
        return lua::Expression::number(value + change).with_position(expression.position);
    }
    if let lua::ExpressionKind::Binary { operator, left, right } = &expression.kind
        && let lua::ExpressionKind::Numeric(value) = right.kind
        && ((*operator == BinaryOperator::Subtraction && value == change)
            || (*operator == BinaryOperator::Addition && value == -change))
    {
        return (**left).clone();
    }
    if change > 0.0 {
        lua::Expression::binary(expression, BinaryOperator::Addition, lua::Expression::number(change))
    } else {
        lua::Expression::binary(expression, BinaryOperator::Subtraction, lua::Expression::number(-change))
    }
}

/// `unpack(t)`, `table.unpack(t)` or `__TS__Unpack(t)` depending on target.
pub fn create_unpack_call(
    ctx: &mut TransformationContext<'_>,
    expression: lua::Expression,
    position: Option<SourcePosition>,
) -> lua::Expression {
    if ctx.lua_target == LuaTarget::Universal {
        return ctx.lualib_call(LuaLibFeature::Unpack, vec![expression], position);
    }
    let unpack = if ctx.lua_target.has_global_unpack() {
        lua::Expression::identifier("unpack")
    } else {
        lua::Expression::property(lua::Expression::identifier("table"), "unpack")
    };
    lua::Expression::call(unpack, vec![expression])
        .with_position(position)
        .set_flags(lua::NodeFlags::TABLE_UNPACK_CALL)
}

/// `tostring(expression)` unless it already is a string for `..`.
pub fn wrap_in_to_string_for_concat(expression: lua::Expression) -> lua::Expression {
    let already_string = match &expression.kind {
        lua::ExpressionKind::String(_) | lua::ExpressionKind::Numeric(_) => true,
        lua::ExpressionKind::Binary { operator, .. } => *operator == BinaryOperator::Concat,
        _ => false,
    };
    if already_string {
        return expression;
    }
    let position = expression.position;
    lua::Expression::call(lua::Expression::identifier("tostring"), vec![expression]).with_position(position)
}

pub fn wrap_in_table(expressions: Vec<lua::Expression>) -> lua::Expression {
    lua::Expression::table_of(expressions)
}

/// `not expression`, unwrapping an existing `not`.
pub fn invert_condition(expression: lua::Expression) -> lua::Expression {
    match expression.kind {
        lua::ExpressionKind::Unary {
            operator: UnaryOperator::Not,
            operand,
        } => *operand,
        kind => {
            let expression = lua::Expression { kind, ..expression };
            let position = expression.position;
            lua::Expression::unary(UnaryOperator::Not, expression).with_position(position)
        }
    }
}

/// `local identifier = initializer`, registered for hoisting when it binds a symbol.
pub fn create_hoistable_variable_declaration(
    ctx: &mut TransformationContext<'_>,
    identifier: lua::Identifier,
    initializer: Option<lua::Expression>,
    position: Option<SourcePosition>,
) -> lua::Statement {
    let symbol = identifier.symbol_id.filter(|id| !id.is_temp());
    let mut declaration =
        lua::Statement::local(vec![identifier], initializer.into_iter().collect()).with_position(position);
    if let Some(symbol) = symbol {
        let id = ctx.next_statement_id();
        declaration = declaration.with_id(id);
        let scope = ctx.peek_scope_mut();
        assert!(
            scope.kind != ScopeKind::SWITCH,
            "switch scopes only hold case statements, not declarations"
        );
        scope.add_variable_declaration(id, SmallVec::from_elem(symbol, 1));
    }
    declaration
}

/// Options for [`create_local_or_exported_or_global_declaration`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclarationOrigin<'s> {
    pub position: Option<SourcePosition>,
    /// Lowering a `function f() {}` declaration.
    pub is_function_declaration: bool,
    pub jsdoc: Option<&'s str>,
}

/// Declare `lhs` the way its binding requires:
///
/// - exported: `____exports.x = rhs` (nothing without a value)
/// - module, nested or no implicit globals: `local x = rhs`; split into a
///   `local x` preceding statement plus `x = rhs` when `x` is referenced more
///   than once already, so the initializer can refer to it
/// - top level of a script: global assignment
pub fn create_local_or_exported_or_global_declaration(
    ctx: &mut TransformationContext<'_>,
    lhs: Vec<lua::Identifier>,
    rhs: Vec<lua::Expression>,
    origin: DeclarationOrigin<'_>,
) -> Vec<lua::Statement> {
    if lhs.is_empty() {
        return Vec::new();
    }
    let mut declaration: Option<lua::Statement> = None;
    let mut assignment: Option<lua::Statement> = None;

    if is_exported_identifier(ctx, &lhs[0]) {
        if rhs.is_empty() {
            return Vec::new();
        }
        let targets = lhs.iter().map(create_exported_identifier).collect();
        assignment = Some(lua::Statement::assign(targets, rhs).with_position(origin.position));
    } else {
        let scope = ctx.peek_scope();
        let is_top_level = scope.kind == ScopeKind::FILE;
        if ctx.is_module || !is_top_level || ctx.options.no_implicit_global_variables {
            let is_function_value = rhs.len() == 1 && rhs[0].as_function().is_some();
            let safe_recursive_function = origin.is_function_declaration && is_function_value;
            let multiple_references = lhs.iter().any(|identifier| {
                identifier
                    .symbol_id
                    .is_some_and(|symbol| scope.reference_count(symbol) > 1)
            });
            let symbols: SmallVec<[lua::SymbolId; 1]> =
                lhs.iter().filter_map(|identifier| identifier.symbol_id).collect();

            if !safe_recursive_function && multiple_references {
                let id = ctx.next_statement_id();
                let preceding = lua::Statement::local(lhs.clone(), Vec::new())
                    .with_position(origin.position)
                    .with_id(id);
                ctx.prepend_preceding_statements(vec![preceding]);
                ctx.peek_scope_mut().add_variable_declaration(id, symbols);
                if !rhs.is_empty() {
                    let targets = lhs.iter().cloned().map(lua::Expression::from).collect();
                    assignment = Some(lua::Statement::assign(targets, rhs).with_position(origin.position));
                }
            } else {
                let id = ctx.next_statement_id();
                let statement = lua::Statement::local(lhs.clone(), rhs)
                    .with_position(origin.position)
                    .with_id(id);
                if !origin.is_function_declaration {
                    ctx.peek_scope_mut().add_variable_declaration(id, symbols);
                }
                declaration = Some(statement);
            }
        } else if !rhs.is_empty() {
            let targets = lhs.iter().cloned().map(lua::Expression::from).collect();
            assignment = Some(lua::Statement::assign(targets, rhs).with_position(origin.position));
        } else {
            return Vec::new();
        }
    }

    if origin.is_function_declaration
        && let Some(symbol) = lhs.first().and_then(|identifier| identifier.symbol_id)
    {
        if let Some(statement) = declaration.as_mut().or(assignment.as_mut()) {
            let id = *statement.id.get_or_insert_with(|| ctx.next_statement_id());
            if let Some(definition) = ctx.peek_scope_mut().function_definitions.get_mut(&symbol) {
                definition.definition = Some(id);
            }
        }
    }

    if !ctx.options.remove_comments
        && let Some(jsdoc) = origin.jsdoc
    {
        let comments = jsdoc_comments(jsdoc);
        if let Some(statement) = declaration.as_mut().or(assignment.as_mut()) {
            statement.leading_comments = comments;
        }
    }

    declaration.into_iter().chain(assignment).collect()
}

/// Doc text as `---` LDoc line comments.
pub fn jsdoc_comments(text: &str) -> Vec<lua::Comment> {
    let mut lines: Vec<String> = text.trim().lines().map(|line| format!(" {}", line.trim())).collect();
    if lines.is_empty() {
        return Vec::new();
    }
    if lines[0].starts_with(" @") {
        lines.insert(0, "-".to_string());
    } else {
        lines[0] = format!("-{}", lines[0]);
    }
    lines.into_iter().map(lua::Comment::Line).collect()
}

#[cfg(test)]
#[path = "../tests/lua_ast_utils.rs"]
mod tests;
