//! `=` in statement and expression position.

use super::access::transform_element_index;
use crate::context::TransformationContext;
use crate::expression_list::move_to_preceding_temp;
use crate::source::{Expression, ExpressionKind};
use tslua_ast as lua;
use tslua_common::diagnostics::diagnostic_messages;

/// Lower an assignment target.
///
/// When the right side produced preceding statements, the table and index of
/// an access target are cached first so those statements cannot change which
/// slot gets written.
pub fn transform_assignment_left_hand_side(
    ctx: &mut TransformationContext<'_>,
    target: &Expression,
    right_has_preceding_statements: bool,
) -> lua::Expression {
    let position = ctx.position(target.pos);
    let target = target.skip_outer();
    if right_has_preceding_statements {
        match &target.kind {
            ExpressionKind::PropertyAccess { expression: object, name } => {
                let table = ctx.transform_expression(object);
                let table = move_to_preceding_temp(ctx, table, Some(object));
                return lua::Expression::property(table, name.clone()).with_position(position);
            }
            ExpressionKind::ElementAccess {
                expression: object,
                argument,
            } => {
                let table = ctx.transform_expression(object);
                let table = move_to_preceding_temp(ctx, table, Some(object));
                let index = ctx.transform_expression(argument);
                let index = transform_element_index(ctx, object, argument, index);
                let index = move_to_preceding_temp(ctx, index, Some(argument));
                return lua::Expression::table_index(table, index).with_position(position);
            }
            _ => {}
        }
    }

    let left = ctx.transform_expression(target);
    if left.is_assignment_left_hand_side() {
        return left;
    }
    let kind = target.syntax_kind().to_string();
    ctx.diagnose(target.pos, &diagnostic_messages::CANNOT_ASSIGN_TO_NODE_OF_KIND, &[&kind]);
    lua::Expression::from(lua::Identifier::temp("____"))
}

/// `target = right`
pub fn transform_assignment(
    ctx: &mut TransformationContext<'_>,
    target: &Expression,
    right: lua::Expression,
    right_has_preceding_statements: bool,
    pos: u32,
) -> Vec<lua::Statement> {
    let left = transform_assignment_left_hand_side(ctx, target, right_has_preceding_statements);
    vec![lua::Statement::assign(vec![left], vec![right]).with_position(ctx.position(pos))]
}

pub fn transform_assignment_with_right_preceding_statements(
    ctx: &mut TransformationContext<'_>,
    target: &Expression,
    right: lua::Expression,
    mut right_preceding: Vec<lua::Statement>,
    pos: u32,
) -> Vec<lua::Statement> {
    let has_preceding = !right_preceding.is_empty();
    right_preceding.extend(transform_assignment(ctx, target, right, has_preceding, pos));
    right_preceding
}

/// `a = b` used as a value.
pub fn transform_assignment_expression(
    ctx: &mut TransformationContext<'_>,
    expression: &Expression,
    left: &Expression,
    right: &Expression,
) -> lua::Expression {
    let position = ctx.position(expression.pos);
    match &left.skip_outer().kind {
        ExpressionKind::PropertyAccess { .. } | ExpressionKind::ElementAccess { .. } => {
            // t[k] = v evaluates to v, which must not be read back from t[k].
            let (preceding, lowered_right) = ctx.run_in_new_frame(|ctx| ctx.transform_expression(right));
            let target = transform_assignment_left_hand_side(ctx, left, !preceding.is_empty());
            ctx.add_preceding_statements(preceding);
            let value = move_to_preceding_temp(ctx, lowered_right, Some(right));
            ctx.add_preceding_statement(
                lua::Statement::assign(vec![target], vec![value.clone()]).with_position(position),
            );
            value
        }
        _ => {
            let target = ctx.transform_expression(left);
            let lowered_right = ctx.transform_expression(right);
            let statements = transform_assignment(ctx, left, lowered_right, false, expression.pos);
            ctx.add_preceding_statements(statements);
            target
        }
    }
}

/// `a = b;`
pub fn transform_assignment_statement(
    ctx: &mut TransformationContext<'_>,
    expression: &Expression,
    left: &Expression,
    right: &Expression,
) -> Vec<lua::Statement> {
    let (preceding, lowered_right) = ctx.run_in_new_frame(|ctx| ctx.transform_expression(right));
    transform_assignment_with_right_preceding_statements(ctx, left, lowered_right, preceding, expression.pos)
}
