//! Expression statements, `return` and blocks.

use super::binary::{transform_binary_expression_statement, transform_unary_expression_statement};
use crate::context::TransformationContext;
use crate::scope::{Scope, ScopeKind, perform_hoisting};
use crate::source::{Expression, ExpressionKind, PostfixOperator, PrefixOperator, Statement, StatementKind};
use tslua_ast as lua;
use tslua_common::SourcePosition;

/// Make a lowered expression legal as a Lua statement.
///
/// Temps and synthetic identifiers or literals are dropped; calls stand on
/// their own; anything else is assigned to a throwaway local.
fn wrap_in_statement(result: lua::Expression) -> Option<lua::Statement> {
    match &result.kind {
        lua::ExpressionKind::Identifier(identifier) if identifier.is_temp() || result.position.is_none() => None,
        _ if result.is_literal() && result.position.is_none() => None,
        _ if result.is_call() => Some(lua::Statement::expression(result)),
        _ => {
            let position = result.position;
            Some(lua::Statement::local(vec![lua::Identifier::temp("____")], vec![result]).with_position(position))
        }
    }
}

pub fn transform_expression_statement(ctx: &mut TransformationContext<'_>, expression: &Expression) -> Vec<lua::Statement> {
    let inner = expression.skip_outer();
    match &inner.kind {
        ExpressionKind::Prefix {
            operator: operator @ (PrefixOperator::Increment | PrefixOperator::Decrement),
            operand,
        } => {
            return transform_unary_expression_statement(ctx, inner, *operator == PrefixOperator::Increment, operand);
        }
        ExpressionKind::Postfix { operator, operand } => {
            return transform_unary_expression_statement(ctx, inner, *operator == PostfixOperator::Increment, operand);
        }
        ExpressionKind::Binary { operator, left, right } => {
            if let Some(statements) = transform_binary_expression_statement(ctx, inner, *operator, left, right) {
                return statements;
            }
        }
        _ => {}
    }
    let result = ctx.transform_expression(expression);
    wrap_in_statement(result).into_iter().collect()
}

/// An expression in statement position, preceded by its own preceding statements.
pub fn transform_expression_as_statements(
    ctx: &mut TransformationContext<'_>,
    expression: &Expression,
) -> Vec<lua::Statement> {
    let (mut statements, lowered) = ctx.run_in_new_frame(|ctx| transform_expression_statement(ctx, expression));
    statements.extend(lowered);
    statements
}

/// `return values`, prefixed with `true` when it leaves a `pcall` callback.
pub fn create_return_statement(
    ctx: &mut TransformationContext<'_>,
    mut values: Vec<lua::Expression>,
    position: Option<SourcePosition>,
) -> lua::Statement {
    if ctx.mark_function_returned() {
        values.insert(0, lua::Expression::boolean(true));
    }
    lua::Statement::ret(values).with_position(position)
}

pub fn transform_return(
    ctx: &mut TransformationContext<'_>,
    statement: &Statement,
    expression: Option<&Expression>,
) -> Vec<lua::Statement> {
    let values = match expression {
        Some(expression) => vec![ctx.transform_expression(expression)],
        None => Vec::new(),
    };
    let position = ctx.position(statement.pos);
    vec![create_return_statement(ctx, values, position)]
}

/// Statements of a block body, or the single statement itself.
pub fn transform_block_or_statement(ctx: &mut TransformationContext<'_>, statement: &Statement) -> Vec<lua::Statement> {
    match &statement.kind {
        StatementKind::Block(statements) => ctx.transform_statements(statements),
        _ => ctx.transform_statements(std::slice::from_ref(statement)),
    }
}

/// Lower `statements` in a fresh scope of `kind` and hoist within it.
pub fn transform_scope_block(
    ctx: &mut TransformationContext<'_>,
    statements: &[Statement],
    kind: ScopeKind,
) -> (lua::Block, Scope) {
    ctx.push_scope(kind);
    let lowered = ctx.transform_statements(statements);
    let lowered = perform_hoisting(ctx, lowered);
    let scope = ctx.pop_scope();
    (lua::Block::new(lowered), scope)
}

pub fn transform_block(
    ctx: &mut TransformationContext<'_>,
    statement: &Statement,
    statements: &[Statement],
) -> Vec<lua::Statement> {
    let (block, _) = transform_scope_block(ctx, statements, ScopeKind::BLOCK);
    vec![lua::Statement::new(lua::StatementKind::Do(block)).with_position(ctx.position(statement.pos))]
}
