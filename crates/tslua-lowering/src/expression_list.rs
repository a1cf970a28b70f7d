//! Order-preserving lowering of expression lists.
//!
//! Lua evaluates call arguments and table constructor fields left to right,
//! but preceding statements of a later element run before the whole list.
//! Any earlier element whose value could change in the meantime is
//! snapshotted into a temp first:
//!
//! ```text
//! f(a, g(), x ?? y())      local ____a_0 = a
//!                          local ____g_result_1 = g()
//!                          local ____x_2 = x
//!                          if ____x_2 == nil then ____x_2 = y() end
//!                          f(____a_0, ____g_result_1, ____x_2)
//! ```
//!
//! When more than [`MAX_ORDERING_TEMPS`] snapshots would be needed, or a
//! spread sits before the last position (only a trailing multi-value expands
//! in Lua), the list is built at runtime in order with the sparse array
//! runtime helpers instead and spread at the use site.

use crate::context::TransformationContext;
use crate::source::{Expression, ExpressionKind};
use tracing::debug;
use tslua_ast as lua;
use tslua_common::LuaLibFeature;
use tslua_common::limits::MAX_ORDERING_TEMPS;

/// Literals, temps, `this`, optional chain continuations and const bindings
/// cannot change before use.
pub fn should_move_to_temp(
    ctx: &TransformationContext<'_>,
    expression: &lua::Expression,
    original: Option<&Expression>,
) -> bool {
    if expression.is_literal() {
        return false;
    }
    if expression.as_identifier().is_some_and(lua::Identifier::is_temp) {
        return false;
    }
    match original.map(Expression::skip_outer) {
        Some(Expression {
            kind: ExpressionKind::This | ExpressionKind::OptionalContinuation,
            ..
        }) => false,
        Some(original) => !is_const_identifier(ctx, original),
        None => true,
    }
}

pub fn is_const_identifier(ctx: &TransformationContext<'_>, expression: &Expression) -> bool {
    match &expression.skip_outer().kind {
        ExpressionKind::Identifier(ident) => ident.symbol.is_some_and(|symbol| ctx.resolver.is_const(symbol)),
        _ => false,
    }
}

/// Cache `expression` in `local ____<hint> = expression` and return the temp.
pub fn move_to_preceding_temp(
    ctx: &mut TransformationContext<'_>,
    expression: lua::Expression,
    original: Option<&Expression>,
) -> lua::Expression {
    if !should_move_to_temp(ctx, &expression, original) {
        return expression;
    }
    let temp = ctx.create_temp_for_lua_expression(&expression);
    let position = expression.position;
    ctx.add_preceding_statement(lua::Statement::local(vec![temp.clone()], vec![expression]).with_position(position));
    lua::Expression::from(temp)
}

struct LoweredList {
    expressions: Vec<lua::Expression>,
    preceding: Vec<Vec<lua::Statement>>,
    /// Index of the last element that produced preceding statements.
    last_preceding_index: Option<usize>,
}

fn transform_each(ctx: &mut TransformationContext<'_>, expressions: &[&Expression]) -> LoweredList {
    let mut lowered = LoweredList {
        expressions: Vec::with_capacity(expressions.len()),
        preceding: Vec::with_capacity(expressions.len()),
        last_preceding_index: None,
    };
    for (i, expression) in expressions.iter().enumerate() {
        let (preceding, result) = ctx.run_in_new_frame(|ctx| ctx.transform_expression(expression));
        if !preceding.is_empty() {
            lowered.last_preceding_index = Some(i);
        }
        lowered.expressions.push(result);
        lowered.preceding.push(preceding);
    }
    lowered
}

fn count_needed_temps(ctx: &TransformationContext<'_>, expressions: &[&Expression], lowered: &LoweredList) -> usize {
    let Some(last) = lowered.last_preceding_index else {
        return 0;
    };
    lowered.expressions[..last]
        .iter()
        .zip(expressions)
        .filter(|(lowered, original)| should_move_to_temp(ctx, lowered, Some(*original)))
        .count()
}

fn use_temps(ctx: &mut TransformationContext<'_>, expressions: &[&Expression], lowered: LoweredList) -> Vec<lua::Expression> {
    let last = lowered.last_preceding_index;
    let mut result = Vec::with_capacity(lowered.expressions.len());
    for (i, (expression, preceding)) in lowered.expressions.into_iter().zip(lowered.preceding).enumerate() {
        ctx.add_preceding_statements(preceding);
        if last.is_some_and(|last| i < last) {
            result.push(move_to_preceding_temp(ctx, expression, expressions.get(i).copied()));
        } else {
            result.push(expression);
        }
    }
    result
}

fn push_to_sparse_array(
    ctx: &mut TransformationContext<'_>,
    array: Option<lua::Identifier>,
    batch: Vec<lua::Expression>,
) -> lua::Identifier {
    match array {
        None => {
            let array = lua::Identifier::new(ctx.create_temp_name(Some("array")));
            let call = ctx.lualib_call(LuaLibFeature::SparseArrayNew, batch, None);
            ctx.add_preceding_statement(lua::Statement::local(vec![array.clone()], vec![call]));
            array
        }
        Some(array) => {
            let mut params = Vec::with_capacity(batch.len() + 1);
            params.push(lua::Expression::from(array.clone()));
            params.extend(batch);
            let call = ctx.lualib_call(LuaLibFeature::SparseArrayPush, params, None);
            ctx.add_preceding_statement(lua::Statement::expression(call));
            array
        }
    }
}

fn use_sparse_array(
    ctx: &mut TransformationContext<'_>,
    expressions: &[&Expression],
    lowered: LoweredList,
) -> Vec<lua::Expression> {
    let mut array = None;
    let mut batch = Vec::new();
    for ((original, expression), preceding) in expressions.iter().zip(lowered.expressions).zip(lowered.preceding) {
        // Elements with preceding statements start a new batch.
        if !preceding.is_empty() && !batch.is_empty() {
            array = Some(push_to_sparse_array(ctx, array, std::mem::take(&mut batch)));
        }
        ctx.add_preceding_statements(preceding);
        batch.push(expression);
        // Spreads end one.
        if original.is_spread() {
            array = Some(push_to_sparse_array(ctx, array, std::mem::take(&mut batch)));
        }
    }
    if !batch.is_empty() || array.is_none() {
        array = Some(push_to_sparse_array(ctx, array, batch));
    }
    let array = array.expect("sparse array is created by the first batch");
    vec![ctx.lualib_call(LuaLibFeature::SparseArraySpread, vec![lua::Expression::from(array)], None)]
}

/// Lower a list whose spreads are flattened into the surrounding call or table.
pub fn transform_expression_list(ctx: &mut TransformationContext<'_>, expressions: &[Expression]) -> Vec<lua::Expression> {
    let expressions: Vec<&Expression> = expressions.iter().collect();
    let lowered = transform_each(ctx, &expressions);
    let spread_before_last = expressions
        .iter()
        .position(|expression| expression.is_spread())
        .is_some_and(|index| index + 1 < expressions.len());
    let needed_temps = count_needed_temps(ctx, &expressions, &lowered);
    if spread_before_last || needed_temps > MAX_ORDERING_TEMPS {
        debug!(
            len = expressions.len(),
            spread_before_last, needed_temps, "expression list falls back to ordered sparse array"
        );
        use_sparse_array(ctx, &expressions, lowered)
    } else {
        use_temps(ctx, &expressions, lowered)
    }
}

/// Lower operands that must evaluate in order, always snapshotting.
pub fn transform_ordered_expressions(
    ctx: &mut TransformationContext<'_>,
    expressions: &[&Expression],
) -> Vec<lua::Expression> {
    let lowered = transform_each(ctx, expressions);
    use_temps(ctx, expressions, lowered)
}

#[cfg(test)]
#[path = "../tests/expression_list.rs"]
mod tests;
