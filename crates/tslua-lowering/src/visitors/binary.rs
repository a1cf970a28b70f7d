//! Binary and unary operators.
//!
//! # Architecture
//!
//! [`transform_binary_operation`] is the shared core: given already lowered
//! operands and the right operand's preceding statements it picks the Lua
//! form. Short-circuit operators whose right side produced statements turn
//! into a temp plus `if`, so the right side only runs when JS would run it:
//!
//! ```text
//! a || f(b ?? g())     local ____a_0 = a
//!                      if not ____a_0 then
//!                          <preceding statements of the right side>
//!                          ____a_0 = f(...)
//!                      end
//! ```
//!
//! Assignments and compound assignments live in [`super::assignment`] and
//! [`super::compound`]; both call back into this module for the operator.

use super::assignment::{transform_assignment_expression, transform_assignment_statement};
use super::compound::{
    CompoundRight, transform_compound_assignment_expression, transform_compound_assignment_statement,
};
use super::statements::transform_expression_as_statements;
use crate::context::TransformationContext;
use crate::expression_list::transform_ordered_expressions;
use crate::lua_ast_utils::wrap_in_to_string_for_concat;
use crate::resolver::TypeFacts;
use crate::source::{BinaryOperator, Expression, PostfixOperator, PrefixOperator};
use tslua_ast::{self as lua, UnaryOperator};
use tslua_common::LuaTarget;
use tslua_common::diagnostics::diagnostic_messages;

/// Where an operation came from: its offset, and the source operands when it
/// is a real binary expression (type queries look at them).
#[derive(Debug, Clone, Copy)]
pub struct OperationOrigin<'s> {
    pub pos: u32,
    pub operands: Option<(&'s Expression, &'s Expression)>,
}

fn simple_operator(operator: BinaryOperator) -> Option<lua::BinaryOperator> {
    Some(match operator {
        BinaryOperator::AmpersandAmpersand => lua::BinaryOperator::And,
        BinaryOperator::BarBar => lua::BinaryOperator::Or,
        BinaryOperator::Plus => lua::BinaryOperator::Addition,
        BinaryOperator::Minus => lua::BinaryOperator::Subtraction,
        BinaryOperator::Asterisk => lua::BinaryOperator::Multiplication,
        BinaryOperator::AsteriskAsterisk => lua::BinaryOperator::Power,
        BinaryOperator::Slash => lua::BinaryOperator::Division,
        BinaryOperator::Percent => lua::BinaryOperator::Modulo,
        BinaryOperator::GreaterThan => lua::BinaryOperator::GreaterThan,
        BinaryOperator::GreaterThanEquals => lua::BinaryOperator::GreaterEqual,
        BinaryOperator::LessThan => lua::BinaryOperator::LessThan,
        BinaryOperator::LessThanEquals => lua::BinaryOperator::LessEqual,
        BinaryOperator::EqualsEquals | BinaryOperator::EqualsEqualsEquals => lua::BinaryOperator::Equality,
        BinaryOperator::ExclamationEquals | BinaryOperator::ExclamationEqualsEquals => {
            lua::BinaryOperator::Inequality
        }
        _ => return None,
    })
}

// =============================================================================
// Bit operations
// =============================================================================

fn bit_library_function(operator: BinaryOperator) -> &'static str {
    match operator {
        BinaryOperator::Ampersand => "band",
        BinaryOperator::Bar => "bor",
        BinaryOperator::Caret => "bxor",
        BinaryOperator::LessThanLessThan => "lshift",
        BinaryOperator::GreaterThanGreaterThan => "arshift",
        BinaryOperator::GreaterThanGreaterThanGreaterThan => "rshift",
        _ => unreachable!("{operator:?} is not a bit operator"),
    }
}

/// Library that provides bit operations on targets without native operators.
fn bit_library(ctx: &mut TransformationContext<'_>, pos: u32) -> Option<&'static str> {
    match ctx.lua_target {
        LuaTarget::Universal | LuaTarget::Lua50 | LuaTarget::Lua51 => {
            ctx.diagnose_unsupported_for_target(pos, "Bitwise operations");
            Some("bit")
        }
        LuaTarget::LuaJit => Some("bit"),
        LuaTarget::Lua52 => Some("bit32"),
        LuaTarget::Lua53 | LuaTarget::Lua54 => None,
    }
}

fn bit_library_call(library: &str, function: &str, params: Vec<lua::Expression>) -> lua::Expression {
    lua::Expression::call(
        lua::Expression::property(lua::Expression::identifier(library), function),
        params,
    )
}

fn transform_binary_bit_operation(
    ctx: &mut TransformationContext<'_>,
    pos: u32,
    left: lua::Expression,
    right: lua::Expression,
    operator: BinaryOperator,
) -> lua::Expression {
    let position = ctx.position(pos);
    if let Some(library) = bit_library(ctx, pos) {
        return bit_library_call(library, bit_library_function(operator), vec![left, right]).with_position(position);
    }
    let lua_operator = match operator {
        BinaryOperator::Bar => lua::BinaryOperator::BitwiseOr,
        BinaryOperator::Caret => lua::BinaryOperator::BitwiseExclusiveOr,
        BinaryOperator::Ampersand => lua::BinaryOperator::BitwiseAnd,
        BinaryOperator::LessThanLessThan => lua::BinaryOperator::BitwiseLeftShift,
        // Lua only has a logical right shift.
        BinaryOperator::GreaterThanGreaterThan => {
            ctx.diagnose(pos, &diagnostic_messages::UNSUPPORTED_RIGHT_SHIFT_OPERATOR, &[]);
            lua::BinaryOperator::BitwiseRightShift
        }
        BinaryOperator::GreaterThanGreaterThanGreaterThan => lua::BinaryOperator::BitwiseRightShift,
        _ => unreachable!("{operator:?} is not a bit operator"),
    };
    lua::Expression::binary(left, lua_operator, right).with_position(position)
}

fn transform_unary_bit_not(ctx: &mut TransformationContext<'_>, pos: u32, operand: lua::Expression) -> lua::Expression {
    let position = ctx.position(pos);
    match bit_library(ctx, pos) {
        Some(library) => bit_library_call(library, "bnot", vec![operand]).with_position(position),
        None => lua::Expression::unary(UnaryOperator::BitwiseNot, operand).with_position(position),
    }
}

// =============================================================================
// Operation core
// =============================================================================

/// `local tmp = lhs; if <cond(tmp)> then <rhs preceding>; tmp = rhs end`
pub fn create_short_circuit_preceding_statements(
    ctx: &mut TransformationContext<'_>,
    lhs: lua::Expression,
    rhs: lua::Expression,
    right_preceding: Vec<lua::Statement>,
    operator: BinaryOperator,
    pos: u32,
) -> (Vec<lua::Statement>, lua::Expression) {
    let position = ctx.position(pos);
    let temp = ctx.create_temp_for_lua_expression(&lhs);
    let declaration = lua::Statement::local(vec![temp.clone()], vec![lhs]).with_position(position);
    let condition = short_circuit_condition(lua::Expression::from(temp.clone()), operator);
    let mut body = right_preceding;
    body.push(lua::Statement::assign(vec![lua::Expression::from(temp.clone())], vec![rhs]));
    let branch = lua::Statement::if_then(condition, lua::Block::new(body), None).with_position(position);
    (vec![declaration, branch], lua::Expression::from(temp))
}

/// Condition under which the right side of `lhs <operator> rhs` runs.
pub fn short_circuit_condition(lhs: lua::Expression, operator: BinaryOperator) -> lua::Expression {
    match operator {
        BinaryOperator::AmpersandAmpersand => lhs,
        BinaryOperator::BarBar => lua::Expression::unary(UnaryOperator::Not, lhs),
        BinaryOperator::QuestionQuestion => {
            lua::Expression::binary(lhs, lua::BinaryOperator::Equality, lua::Expression::nil())
        }
        _ => unreachable!("{operator:?} does not short-circuit"),
    }
}

fn transform_nullish_coalescing(
    ctx: &mut TransformationContext<'_>,
    origin: OperationOrigin<'_>,
    left: lua::Expression,
    right: lua::Expression,
) -> lua::Expression {
    // `lhs or rhs` is only right when lhs can never be `false`.
    let left_can_be_false = origin
        .operands
        .is_some_and(|(source_left, _)| ctx.type_facts(source_left.id).can_be_falsy_when_not_null());
    if left_can_be_false {
        let (preceding, result) = create_short_circuit_preceding_statements(
            ctx,
            left,
            right,
            Vec::new(),
            BinaryOperator::QuestionQuestion,
            origin.pos,
        );
        ctx.add_preceding_statements(preceding);
        return result;
    }
    lua::Expression::binary(left, lua::BinaryOperator::Or, right).with_position(ctx.position(origin.pos))
}

fn transform_binary_operation_without_preceding_statements(
    ctx: &mut TransformationContext<'_>,
    origin: OperationOrigin<'_>,
    mut left: lua::Expression,
    mut right: lua::Expression,
    operator: BinaryOperator,
) -> lua::Expression {
    if operator.is_bitwise() {
        return transform_binary_bit_operation(ctx, origin.pos, left, right, operator);
    }
    if operator == BinaryOperator::QuestionQuestion {
        return transform_nullish_coalescing(ctx, origin, left, right);
    }
    let position = ctx.position(origin.pos);
    if operator == BinaryOperator::Percent && ctx.lua_target == LuaTarget::Lua50 {
        let math_mod = lua::Expression::property(lua::Expression::identifier("math"), "mod");
        return lua::Expression::call(math_mod, vec![left, right]).with_position(position);
    }

    let mut lua_operator = simple_operator(operator)
        .unwrap_or_else(|| unreachable!("{operator:?} is lowered before operator mapping"));
    if operator == BinaryOperator::Plus
        && let Some((source_left, source_right)) = origin.operands
    {
        let left_is_string = ctx.type_facts(source_left.id).contains(TypeFacts::STRING);
        let right_is_string = ctx.type_facts(source_right.id).contains(TypeFacts::STRING);
        if left_is_string || right_is_string {
            if !left_is_string {
                left = wrap_in_to_string_for_concat(left);
            }
            if !right_is_string {
                right = wrap_in_to_string_for_concat(right);
            }
            lua_operator = lua::BinaryOperator::Concat;
        }
    }
    lua::Expression::binary(left, lua_operator, right).with_position(position)
}

/// Combine lowered operands with `operator`, returning the statements that
/// must run first together with the result.
pub fn transform_binary_operation(
    ctx: &mut TransformationContext<'_>,
    origin: OperationOrigin<'_>,
    left: lua::Expression,
    right: lua::Expression,
    right_preceding: Vec<lua::Statement>,
    operator: BinaryOperator,
) -> (Vec<lua::Statement>, lua::Expression) {
    if !right_preceding.is_empty() && operator.is_short_circuit() {
        return create_short_circuit_preceding_statements(ctx, left, right, right_preceding, operator, origin.pos);
    }
    let result = transform_binary_operation_without_preceding_statements(ctx, origin, left, right, operator);
    (right_preceding, result)
}

// =============================================================================
// Visitors
// =============================================================================

pub fn transform_binary(
    ctx: &mut TransformationContext<'_>,
    expression: &Expression,
    operator: BinaryOperator,
    left: &Expression,
    right: &Expression,
) -> lua::Expression {
    let origin = OperationOrigin {
        pos: expression.pos,
        operands: Some((left, right)),
    };
    if let Some(base) = operator.compound_base() {
        return transform_compound_assignment_expression(ctx, origin, left, CompoundRight::Source(right), base, false);
    }

    match operator {
        BinaryOperator::Equals => return transform_assignment_expression(ctx, expression, left, right),
        BinaryOperator::In => {
            let position = ctx.position(expression.pos);
            let mut lowered = transform_ordered_expressions(ctx, &[left, right]).into_iter();
            let (Some(key), Some(table)) = (lowered.next(), lowered.next()) else {
                unreachable!("two operands were lowered");
            };
            let index = lua::Expression::table_index(table, key);
            return lua::Expression::binary(index, lua::BinaryOperator::Inequality, lua::Expression::nil())
                .with_position(position);
        }
        BinaryOperator::Comma => {
            let mut statements = transform_expression_as_statements(ctx, left);
            let (preceding, result) = ctx.run_in_new_frame(|ctx| ctx.transform_expression(right));
            statements.extend(preceding);
            ctx.add_preceding_statements(statements);
            return result;
        }
        BinaryOperator::AmpersandAmpersand | BinaryOperator::BarBar | BinaryOperator::QuestionQuestion => {
            let lhs = ctx.transform_expression(left);
            let (right_preceding, rhs) = ctx.run_in_new_frame(|ctx| ctx.transform_expression(right));
            let (preceding, result) = transform_binary_operation(ctx, origin, lhs, rhs, right_preceding, operator);
            ctx.add_preceding_statements(preceding);
            return result;
        }
        _ => {}
    }

    let (ordered_preceding, operands) = ctx.run_in_new_frame(|ctx| transform_ordered_expressions(ctx, &[left, right]));
    let mut operands = operands.into_iter();
    let (Some(lhs), Some(rhs)) = (operands.next(), operands.next()) else {
        unreachable!("two operands were lowered");
    };
    let (preceding, result) = transform_binary_operation(ctx, origin, lhs, rhs, ordered_preceding, operator);
    ctx.add_preceding_statements(preceding);
    result
}

/// Statement forms that need no result value: `x += 1`, `a = b`, `a, b`.
pub fn transform_binary_expression_statement(
    ctx: &mut TransformationContext<'_>,
    expression: &Expression,
    operator: BinaryOperator,
    left: &Expression,
    right: &Expression,
) -> Option<Vec<lua::Statement>> {
    if let Some(base) = operator.compound_base() {
        let origin = OperationOrigin {
            pos: expression.pos,
            operands: Some((left, right)),
        };
        return Some(transform_compound_assignment_statement(
            ctx,
            origin,
            left,
            CompoundRight::Source(right),
            base,
        ));
    }
    match operator {
        BinaryOperator::Equals => Some(transform_assignment_statement(ctx, expression, left, right)),
        BinaryOperator::Comma => {
            let mut statements = transform_expression_as_statements(ctx, left);
            statements.extend(transform_expression_as_statements(ctx, right));
            Some(vec![
                lua::Statement::do_block(statements).with_position(ctx.position(expression.pos)),
            ])
        }
        _ => None,
    }
}

fn increment_operator(increment: bool) -> BinaryOperator {
    if increment {
        BinaryOperator::Plus
    } else {
        BinaryOperator::Minus
    }
}

pub fn transform_prefix(
    ctx: &mut TransformationContext<'_>,
    expression: &Expression,
    operator: PrefixOperator,
    operand: &Expression,
) -> lua::Expression {
    let position = ctx.position(expression.pos);
    let origin = OperationOrigin {
        pos: expression.pos,
        operands: None,
    };
    match operator {
        PrefixOperator::Increment | PrefixOperator::Decrement => transform_compound_assignment_expression(
            ctx,
            origin,
            operand,
            CompoundRight::One,
            increment_operator(operator == PrefixOperator::Increment),
            false,
        ),
        PrefixOperator::Plus => {
            let lowered = ctx.transform_expression(operand);
            if ctx.type_facts(operand.id).contains(TypeFacts::NUMBER) {
                lowered
            } else {
                lua::Expression::call(lua::Expression::identifier("tonumber"), vec![lowered]).with_position(position)
            }
        }
        PrefixOperator::Minus => {
            let lowered = ctx.transform_expression(operand);
            lua::Expression::unary(UnaryOperator::Negation, lowered).with_position(position)
        }
        PrefixOperator::Not => {
            let lowered = ctx.transform_expression(operand);
            lua::Expression::unary(UnaryOperator::Not, lowered).with_position(position)
        }
        PrefixOperator::Tilde => {
            let lowered = ctx.transform_expression(operand);
            transform_unary_bit_not(ctx, expression.pos, lowered)
        }
    }
}

pub fn transform_postfix(
    ctx: &mut TransformationContext<'_>,
    expression: &Expression,
    operator: PostfixOperator,
    operand: &Expression,
) -> lua::Expression {
    let origin = OperationOrigin {
        pos: expression.pos,
        operands: None,
    };
    transform_compound_assignment_expression(
        ctx,
        origin,
        operand,
        CompoundRight::One,
        increment_operator(operator == PostfixOperator::Increment),
        true,
    )
}

/// `x++` / `--x` as a statement: no temp for the old value is needed.
pub fn transform_unary_expression_statement(
    ctx: &mut TransformationContext<'_>,
    expression: &Expression,
    increment: bool,
    operand: &Expression,
) -> Vec<lua::Statement> {
    let origin = OperationOrigin {
        pos: expression.pos,
        operands: None,
    };
    transform_compound_assignment_statement(ctx, origin, operand, CompoundRight::One, increment_operator(increment))
}
