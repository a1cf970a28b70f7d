//! Property/element access, calls and spread.

use crate::context::TransformationContext;
use crate::expression_list::{move_to_preceding_temp, transform_expression_list, transform_ordered_expressions};
use crate::lua_ast_utils::{add_to_numeric_expression, create_unpack_call};
use crate::resolver::{ContextType, TypeFacts};
use crate::source::{Expression, ExpressionKind};
use tslua_ast::names::is_valid_lua_identifier;
use tslua_ast::{self as lua, UnaryOperator};

/// `...xs` -> `unpack(xs)`
pub fn transform_spread(ctx: &mut TransformationContext<'_>, expression: &Expression, inner: &Expression) -> lua::Expression {
    let lowered = ctx.transform_expression(inner);
    let position = ctx.position(expression.pos);
    create_unpack_call(ctx, lowered, position)
}

pub fn transform_property_access(
    ctx: &mut TransformationContext<'_>,
    expression: &Expression,
    object: &Expression,
    name: &str,
) -> lua::Expression {
    let position = ctx.position(expression.pos);
    let table = ctx.transform_expression(object);
    if name == "length" && ctx.type_facts(object.id).intersects(TypeFacts::ARRAY | TypeFacts::STRING) {
        return lua::Expression::unary(UnaryOperator::Length, table).with_position(position);
    }
    lua::Expression::property(table, name).with_position(position)
}

/// Index into a Lua array needs `+ 1` for numeric indices.
pub fn transform_element_index(
    ctx: &TransformationContext<'_>,
    object: &Expression,
    argument: &Expression,
    index: lua::Expression,
) -> lua::Expression {
    if ctx.type_facts(object.id).contains(TypeFacts::ARRAY)
        && ctx.type_facts(argument.id).contains(TypeFacts::NUMBER)
    {
        add_to_numeric_expression(index, 1.0)
    } else {
        index
    }
}

pub fn transform_element_access(
    ctx: &mut TransformationContext<'_>,
    expression: &Expression,
    object: &Expression,
    argument: &Expression,
) -> lua::Expression {
    let position = ctx.position(expression.pos);
    let mut lowered = transform_ordered_expressions(ctx, &[object, argument]).into_iter();
    let (Some(table), Some(index)) = (lowered.next(), lowered.next()) else {
        unreachable!("two operands were lowered");
    };
    let index = transform_element_index(ctx, object, argument, index);
    lua::Expression::table_index(table, index).with_position(position)
}

/// Lower the call target and arguments in order; the target is cached in a
/// temp when argument lowering produced preceding statements.
fn transform_callee_and_arguments(
    ctx: &mut TransformationContext<'_>,
    callee: &Expression,
    arguments: &[Expression],
    lower_callee: impl FnOnce(&mut TransformationContext<'_>) -> lua::Expression,
) -> (lua::Expression, Vec<lua::Expression>) {
    let (callee_preceding, lowered_callee) = ctx.run_in_new_frame(lower_callee);
    let (argument_preceding, lowered_arguments) = ctx.run_in_new_frame(|ctx| transform_expression_list(ctx, arguments));
    ctx.add_preceding_statements(callee_preceding);
    let lowered_callee = if argument_preceding.is_empty() {
        lowered_callee
    } else {
        move_to_preceding_temp(ctx, lowered_callee, Some(callee))
    };
    ctx.add_preceding_statements(argument_preceding);
    (lowered_callee, lowered_arguments)
}

pub fn transform_call(
    ctx: &mut TransformationContext<'_>,
    expression: &Expression,
    callee: &Expression,
    arguments: &[Expression],
) -> lua::Expression {
    let position = ctx.position(expression.pos);
    let context_type = ctx.resolver.context_type(callee.id);
    let target = callee.skip_outer();

    // obj.m?.(args) -> m(obj, args), with `obj` captured by the chain.
    if matches!(target.kind, ExpressionKind::OptionalContinuation) {
        let this_value = ctx.optional_continuation().and_then(|continuation| continuation.this_value.clone());
        let (function, mut params) =
            transform_callee_and_arguments(ctx, callee, arguments, |ctx| ctx.transform_expression(callee));
        if context_type == ContextType::NonVoid {
            params.insert(0, this_value.unwrap_or_else(lua::Expression::nil));
        }
        return lua::Expression::call(function, params).with_position(position);
    }

    if context_type == ContextType::NonVoid {
        match &target.kind {
            // obj.m(args) -> obj:m(args)
            ExpressionKind::PropertyAccess { expression: object, name }
                if is_valid_lua_identifier(name, ctx.lua_target.allows_unicode_identifiers()) =>
            {
                let (table, params) =
                    transform_callee_and_arguments(ctx, object, arguments, |ctx| ctx.transform_expression(object));
                return lua::Expression::method_call(table, name.clone(), params).with_position(position);
            }
            // obj[k](args) -> local t = obj; t[k](t, args)
            ExpressionKind::PropertyAccess { expression: object, .. }
            | ExpressionKind::ElementAccess { expression: object, .. } => {
                let (function, mut params) = transform_callee_and_arguments(ctx, callee, arguments, |ctx| {
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
                    lua::Expression::table_index(table, index)
                });
                let self_argument = match &function.kind {
                    lua::ExpressionKind::TableIndex { table, .. } => (**table).clone(),
                    _ => lua::Expression::nil(),
                };
                params.insert(0, self_argument);
                return lua::Expression::call(function, params).with_position(position);
            }
            _ => {
                let (function, mut params) =
                    transform_callee_and_arguments(ctx, callee, arguments, |ctx| ctx.transform_expression(callee));
                params.insert(0, lua::Expression::nil());
                return lua::Expression::call(function, params).with_position(position);
            }
        }
    }

    let (function, params) = transform_callee_and_arguments(ctx, callee, arguments, |ctx| ctx.transform_expression(callee));
    lua::Expression::call(function, params).with_position(position)
}
