//! `c ? a : b` and `if` statements.

use super::statements::transform_block_or_statement;
use crate::context::TransformationContext;
use crate::scope::{ScopeKind, perform_hoisting};
use crate::source::{Expression, Statement, StatementKind};
use tslua_ast as lua;

/// `a` in `c and a or b` must never be `false` or `nil`.
fn is_truthy_literal(expression: &lua::Expression) -> bool {
    matches!(
        expression.kind,
        lua::ExpressionKind::Boolean(true)
            | lua::ExpressionKind::Numeric(_)
            | lua::ExpressionKind::String(_)
            | lua::ExpressionKind::Table(_)
            | lua::ExpressionKind::Function(_)
    )
}

pub fn transform_conditional(
    ctx: &mut TransformationContext<'_>,
    expression: &Expression,
    condition: &Expression,
    when_true: &Expression,
    when_false: &Expression,
) -> lua::Expression {
    let position = ctx.position(expression.pos);
    let condition = ctx.transform_expression(condition);
    let (true_preceding, when_true) = ctx.run_in_new_frame(|ctx| ctx.transform_expression(when_true));
    let (false_preceding, when_false) = ctx.run_in_new_frame(|ctx| ctx.transform_expression(when_false));

    if true_preceding.is_empty() && false_preceding.is_empty() && is_truthy_literal(&when_true) {
        let and = lua::Expression::binary(condition, lua::BinaryOperator::And, when_true);
        return lua::Expression::binary(and, lua::BinaryOperator::Or, when_false).with_position(position);
    }

    // local ____temp; if c then ____temp = a else ____temp = b end
    let temp = lua::Identifier::temp(ctx.create_temp_name(None));
    let declaration = lua::Statement::local(vec![temp.clone()], Vec::new()).with_position(position);
    let mut true_block = true_preceding;
    true_block.push(lua::Statement::assign(vec![lua::Expression::from(temp.clone())], vec![when_true]));
    let mut false_block = false_preceding;
    false_block.push(lua::Statement::assign(vec![lua::Expression::from(temp.clone())], vec![when_false]));
    let branch = lua::Statement::if_then(
        condition,
        lua::Block::new(true_block),
        Some(lua::ElseBranch::Block(lua::Block::new(false_block))),
    )
    .with_position(position);
    ctx.add_preceding_statements([declaration, branch]);
    lua::Expression::from(temp).with_position(position)
}

fn transform_branch(ctx: &mut TransformationContext<'_>, statement: &Statement) -> lua::Block {
    ctx.push_scope(ScopeKind::CONDITIONAL);
    let statements = transform_block_or_statement(ctx, statement);
    let statements = perform_hoisting(ctx, statements);
    ctx.pop_scope();
    lua::Block::new(statements)
}

fn transform_if_statement(
    ctx: &mut TransformationContext<'_>,
    condition: &Expression,
    then_statement: &Statement,
    else_statement: Option<&Statement>,
) -> lua::IfStatement {
    let condition = ctx.transform_expression(condition);
    let if_block = transform_branch(ctx, then_statement);

    let else_block = else_statement.map(|else_statement| match &else_statement.kind {
        StatementKind::If {
            condition,
            then_statement,
            else_statement: nested_else,
        } => {
            // The nested condition's preceding statements must stay inside the
            // else branch, which rules out `elseif`.
            let (preceding, nested) = ctx.run_in_new_frame(|ctx| {
                transform_if_statement(ctx, condition, then_statement, nested_else.as_deref())
            });
            if preceding.is_empty() {
                lua::ElseBranch::If(Box::new(nested))
            } else {
                let position = ctx.position(else_statement.pos);
                let mut statements = preceding;
                statements.push(lua::Statement::new(lua::StatementKind::If(nested)).with_position(position));
                lua::ElseBranch::Block(lua::Block::new(statements))
            }
        }
        _ => lua::ElseBranch::Block(transform_branch(ctx, else_statement)),
    });

    lua::IfStatement {
        condition,
        if_block,
        else_block,
    }
}

pub fn transform_if(
    ctx: &mut TransformationContext<'_>,
    statement: &Statement,
    condition: &Expression,
    then_statement: &Statement,
    else_statement: Option<&Statement>,
) -> Vec<lua::Statement> {
    let lowered = transform_if_statement(ctx, condition, then_statement, else_statement);
    vec![lua::Statement::new(lua::StatementKind::If(lowered)).with_position(ctx.position(statement.pos))]
}
