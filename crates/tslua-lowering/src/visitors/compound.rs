//! Compound assignment (`+=`, `??=`, ...) and `++`/`--`.
//!
//! Access targets are read and written through cached object and index
//! temps so their side effects happen once:
//!
//! ```text
//! t[f()] += 1      local ____t_0, ____f_result_1 = t, f()
//!                  local ____temp_2 = ____t_0[____f_result_1] + 1
//!                  ____t_0[____f_result_1] = ____temp_2
//! ```
//!
//! `&&=`, `||=` and `??=` only assign when the operator would evaluate its
//! right side: `if lhs == nil then lhs = rhs end`.

use super::assignment::{transform_assignment, transform_assignment_with_right_preceding_statements};
use super::binary::{OperationOrigin, short_circuit_condition, transform_binary_operation};
use crate::context::TransformationContext;
use crate::source::{BinaryOperator, Expression};
use tslua_ast as lua;
use tslua_common::diagnostics::diagnostic_messages;

/// Right operand of a compound assignment.
#[derive(Debug, Clone, Copy)]
pub enum CompoundRight<'s> {
    Source(&'s Expression),
    /// The implicit `1` of `++` and `--`.
    One,
}

fn transform_right(ctx: &mut TransformationContext<'_>, right: CompoundRight<'_>) -> (Vec<lua::Statement>, lua::Expression) {
    match right {
        CompoundRight::Source(expression) => ctx.run_in_new_frame(|ctx| ctx.transform_expression(expression)),
        CompoundRight::One => (Vec::new(), lua::Expression::number(1.0)),
    }
}

fn is_setter_skipping(operator: BinaryOperator) -> bool {
    operator.is_short_circuit()
}

/// `if <cond(lhs)> then <right preceding>; lhs = right end`
fn transform_setter_skipping_compound_assignment(
    ctx: &TransformationContext<'_>,
    lhs: lua::Expression,
    operator: BinaryOperator,
    right: lua::Expression,
    mut right_preceding: Vec<lua::Statement>,
    pos: u32,
) -> Vec<lua::Statement> {
    let position = ctx.position(pos);
    let condition = short_circuit_condition(lhs.clone(), operator);
    right_preceding.push(lua::Statement::assign(vec![lhs], vec![right]).with_position(position));
    vec![lua::Statement::if_then(condition, lua::Block::new(right_preceding), None).with_position(position)]
}

/// A lowered target that Lua can assign to, or a diagnostic.
fn transform_target(ctx: &mut TransformationContext<'_>, pos: u32, target: &Expression) -> Option<lua::Expression> {
    let left = ctx.transform_expression(target);
    if left.is_assignment_left_hand_side() {
        return Some(left);
    }
    let kind = target.skip_outer().syntax_kind().to_string();
    ctx.diagnose(pos, &diagnostic_messages::CANNOT_ASSIGN_TO_NODE_OF_KIND, &[&kind]);
    None
}

/// `local ____obj, ____index = table, index` and the access through them.
fn cache_table_index(
    ctx: &mut TransformationContext<'_>,
    table: lua::Expression,
    index: lua::Expression,
) -> (lua::Statement, lua::Expression) {
    let object = ctx.create_temp_for_lua_expression(&table);
    let key = ctx.create_temp_for_lua_expression(&index);
    let declaration = lua::Statement::local(vec![object.clone(), key.clone()], vec![table, index]);
    let access = lua::Expression::table_index(lua::Expression::from(object), lua::Expression::from(key));
    (declaration, access)
}

fn has_side_effect(expression: &lua::Expression) -> bool {
    !(expression.is_literal() || expression.as_identifier().is_some())
}

fn transform_compound_assignment(
    ctx: &mut TransformationContext<'_>,
    origin: OperationOrigin<'_>,
    target: &Expression,
    right: CompoundRight<'_>,
    operator: BinaryOperator,
    is_postfix: bool,
) -> (Vec<lua::Statement>, lua::Expression) {
    let Some(left) = transform_target(ctx, origin.pos, target) else {
        return (Vec::new(), lua::Expression::nil());
    };
    let (right_preceding, right) = transform_right(ctx, right);
    let position = ctx.position(origin.pos);

    if let lua::ExpressionKind::TableIndex { table, index } = left.kind.clone() {
        let (cache, access) = cache_table_index(ctx, *table, *index);
        if is_setter_skipping(operator) && !is_postfix {
            // The value is read back through the cached temps.
            let mut statements = vec![cache];
            statements.extend(transform_setter_skipping_compound_assignment(
                ctx,
                access.clone(),
                operator,
                right,
                right_preceding,
                origin.pos,
            ));
            return (statements, access);
        }
        let temp = ctx.create_temp_for_lua_expression(&left);
        if is_postfix {
            // local ____tmp = ____obj[____index]
            // ____obj[____index] = ____tmp <op> right
            let temp_declaration = lua::Statement::local(vec![temp.clone()], vec![access.clone()]);
            let (preceding, operation) = transform_binary_operation(
                ctx,
                origin,
                lua::Expression::from(temp.clone()),
                right,
                right_preceding,
                operator,
            );
            let assignment = lua::Statement::assign(vec![access], vec![operation]).with_position(position);
            let mut statements = vec![cache];
            statements.extend(preceding);
            statements.push(temp_declaration);
            statements.push(assignment);
            return (statements, lua::Expression::from(temp));
        }
        // local ____tmp = ____obj[____index] <op> right
        // ____obj[____index] = ____tmp
        let (preceding, operation) =
            transform_binary_operation(ctx, origin, access.clone(), right, right_preceding, operator);
        let temp_declaration = lua::Statement::local(vec![temp.clone()], vec![operation]);
        let assignment =
            lua::Statement::assign(vec![access], vec![lua::Expression::from(temp.clone())]).with_position(position);
        let mut statements = vec![cache];
        statements.extend(preceding);
        statements.push(temp_declaration);
        statements.push(assignment);
        return (statements, lua::Expression::from(temp));
    }

    if is_postfix {
        // local ____tmp = x; x = ____tmp <op> right
        let temp = ctx.create_temp_for_lua_expression(&left);
        let temp_declaration = lua::Statement::local(vec![temp.clone()], vec![left]);
        let (preceding, operation) = transform_binary_operation(
            ctx,
            origin,
            lua::Expression::from(temp.clone()),
            right,
            right_preceding,
            operator,
        );
        let has_preceding = !preceding.is_empty();
        let mut statements = vec![temp_declaration];
        statements.extend(preceding);
        statements.extend(transform_assignment(ctx, target, operation, has_preceding, origin.pos));
        return (statements, lua::Expression::from(temp));
    }

    if !right_preceding.is_empty() && is_setter_skipping(operator) {
        let statements =
            transform_setter_skipping_compound_assignment(ctx, left.clone(), operator, right, right_preceding, origin.pos);
        return (statements, left);
    }

    // x = x <op> right
    let (preceding, operation) = transform_binary_operation(ctx, origin, left.clone(), right, right_preceding, operator);
    let statements = transform_assignment_with_right_preceding_statements(ctx, target, operation, preceding, origin.pos);
    (statements, left)
}

/// Compound assignment used as a value.
pub fn transform_compound_assignment_expression(
    ctx: &mut TransformationContext<'_>,
    origin: OperationOrigin<'_>,
    target: &Expression,
    right: CompoundRight<'_>,
    operator: BinaryOperator,
    is_postfix: bool,
) -> lua::Expression {
    let (preceding, result) = transform_compound_assignment(ctx, origin, target, right, operator, is_postfix);
    ctx.add_preceding_statements(preceding);
    result
}

/// Compound assignment whose value is unused.
pub fn transform_compound_assignment_statement(
    ctx: &mut TransformationContext<'_>,
    origin: OperationOrigin<'_>,
    target: &Expression,
    right: CompoundRight<'_>,
    operator: BinaryOperator,
) -> Vec<lua::Statement> {
    let Some(left) = transform_target(ctx, origin.pos, target) else {
        return Vec::new();
    };
    let (right_preceding, right) = transform_right(ctx, right);

    if let lua::ExpressionKind::TableIndex { table, index } = &left.kind
        && (has_side_effect(table) || has_side_effect(index) || !right_preceding.is_empty())
    {
        let (cache, access) = cache_table_index(ctx, (**table).clone(), (**index).clone());
        let mut statements = vec![cache];
        if is_setter_skipping(operator) {
            statements.extend(transform_setter_skipping_compound_assignment(
                ctx,
                access,
                operator,
                right,
                right_preceding,
                origin.pos,
            ));
            return statements;
        }
        let (preceding, operation) =
            transform_binary_operation(ctx, origin, access.clone(), right, right_preceding, operator);
        statements.extend(preceding);
        statements.push(lua::Statement::assign(vec![access], vec![operation]).with_position(ctx.position(origin.pos)));
        return statements;
    }

    if is_setter_skipping(operator) {
        return transform_setter_skipping_compound_assignment(ctx, left, operator, right, right_preceding, origin.pos);
    }
    // x = x <op> right
    let (preceding, operation) = transform_binary_operation(ctx, origin, left, right, right_preceding, operator);
    transform_assignment_with_right_preceding_statements(ctx, target, operation, preceding, origin.pos)
}
