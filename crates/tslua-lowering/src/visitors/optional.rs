//! Optional chains: `a?.b`, `a?.[k]`, `a?.()`.
//!
//! The left side is cached in a temp and the rest of the chain runs only when
//! that temp is not nil, writing its result back into the same temp:
//!
//! ```text
//! const r = a?.b.c()       local ____a_0 = a
//!                          if ____a_0 ~= nil then
//!                              ____a_0 = ____a_0.b:c()
//!                          end
//!                          local r = ____a_0
//! ```
//!
//! A chain that calls its left side directly (`obj.m?.()`) reads the method
//! through a cached `obj`, which is then passed as `self`.

use super::access::transform_element_index;
use crate::context::{OptionalContinuation, TransformationContext};
use crate::expression_list::move_to_preceding_temp;
use crate::resolver::ContextType;
use crate::source::{Expression, ExpressionKind, NodeId};
use tracing::trace;
use tslua_ast as lua;
use tslua_common::diagnostics::diagnostic_messages;

/// Node of the continuation when the chain calls it: `?.()`, `?.().x`.
fn called_continuation(expression: &Expression) -> Option<NodeId> {
    match &expression.skip_outer().kind {
        ExpressionKind::Call { callee, .. } => match callee.skip_outer() {
            continuation @ Expression {
                kind: ExpressionKind::OptionalContinuation,
                ..
            } => Some(continuation.id),
            callee => called_continuation(callee),
        },
        ExpressionKind::PropertyAccess { expression, .. } | ExpressionKind::ElementAccess { expression, .. } => {
            called_continuation(expression)
        }
        _ => None,
    }
}

/// Lower `object.name` / `object[argument]` with `object` cached, returning
/// the access and the cached object.
fn transform_left_with_this_capture(
    ctx: &mut TransformationContext<'_>,
    left: &Expression,
) -> Option<(lua::Expression, lua::Expression)> {
    let target = left.skip_outer();
    let object = match &target.kind {
        ExpressionKind::PropertyAccess { expression, .. } | ExpressionKind::ElementAccess { expression, .. } => expression,
        _ => return None,
    };
    let table = ctx.transform_expression(object);
    let table = move_to_preceding_temp(ctx, table, Some(object));
    let index = match &target.kind {
        ExpressionKind::PropertyAccess { name, .. } => lua::Expression::string(name.clone()),
        ExpressionKind::ElementAccess { argument, .. } => {
            let index = ctx.transform_expression(argument);
            transform_element_index(ctx, object, argument, index)
        }
        _ => unreachable!("matched above"),
    };
    let position = ctx.position(left.pos);
    Some((lua::Expression::table_index(table.clone(), index).with_position(position), table))
}

pub fn transform_optional_chain(
    ctx: &mut TransformationContext<'_>,
    expression: &Expression,
    left: &Expression,
    continuation: &Expression,
) -> lua::Expression {
    let position = ctx.position(expression.pos);

    let method_call = called_continuation(continuation)
        .is_some_and(|node| ctx.resolver.context_type(node) == ContextType::NonVoid);
    let captured = if method_call {
        transform_left_with_this_capture(ctx, left)
    } else {
        None
    };
    let (value, this_value) = match captured {
        Some((value, this_value)) => (value, Some(this_value)),
        None => (ctx.transform_expression(left), None),
    };

    // A nested chain already produced a temp holding only its own result.
    let temp = match value.as_identifier() {
        Some(identifier) if identifier.is_temp() && matches!(left.skip_outer().kind, ExpressionKind::OptionalChain { .. }) => {
            identifier.clone()
        }
        _ => {
            let temp = ctx.create_temp_for_lua_expression(&value);
            ctx.add_preceding_statement(lua::Statement::local(vec![temp.clone()], vec![value]).with_position(position));
            temp
        }
    };
    trace!(temp = %temp.text, method_call, "optional chain");

    let data = OptionalContinuation {
        value: temp.clone(),
        this_value,
    };
    let (mut body, result) = ctx.run_in_new_frame(|ctx| {
        ctx.run_with_optional_continuation(data, |ctx| ctx.transform_expression(continuation))
    });
    body.push(lua::Statement::assign(vec![lua::Expression::from(temp.clone())], vec![result]));
    let condition = lua::Expression::binary(
        lua::Expression::from(temp.clone()),
        lua::BinaryOperator::Inequality,
        lua::Expression::nil(),
    );
    ctx.add_preceding_statement(lua::Statement::if_then(condition, lua::Block::new(body), None).with_position(position));
    lua::Expression::from(temp).with_position(position)
}

pub fn transform_optional_continuation(ctx: &mut TransformationContext<'_>, expression: &Expression) -> lua::Expression {
    match ctx.optional_continuation() {
        Some(continuation) => {
            let position = ctx.position(expression.pos);
            lua::Expression::from(continuation.value.clone()).with_position(position)
        }
        None => {
            ctx.diagnose(
                expression.pos,
                &diagnostic_messages::UNSUPPORTED_NODE_KIND,
                &["optional continuation outside an optional chain"],
            );
            lua::Expression::nil()
        }
    }
}
