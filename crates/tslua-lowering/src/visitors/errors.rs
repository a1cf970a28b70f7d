//! `throw` and `try`/`catch`/`finally` on top of `pcall`.
//!
//! ```text
//! try {                  do
//!     return f();            local function ____catch(e)
//! } catch (e) {                  g(e)
//!     g(e);                  end
//! } finally {                local ____try, ____hasReturned, ____returnValue = pcall(function()
//!     h();                       return true, f()
//! }                          end)
//!                            if not ____try then
//!                                ____hasReturned, ____returnValue = ____catch(____hasReturned)
//!                            end
//!                            h()
//!                            if ____hasReturned then
//!                                return ____returnValue
//!                            end
//!                        end
//! ```
//!
//! A `return` inside the try or catch body returns `true, value` out of its
//! callback; the flag travels back through the scope stack
//! (`function_returned`) to decide whether the forwarding code is needed.

use super::identifier::transform_identifier;
use super::statements::{create_return_statement, transform_scope_block};
use super::variable::transform_binding_pattern;
use crate::context::TransformationContext;
use crate::scope::ScopeKind;
use crate::source::{BindingName, CatchClause, Expression, Statement};
use tslua_ast::{self as lua, UnaryOperator};

/// `error(value, 0)`: level 0 keeps the thrown value free of position info.
pub fn transform_throw(
    ctx: &mut TransformationContext<'_>,
    statement: &Statement,
    expression: &Expression,
) -> Vec<lua::Statement> {
    let value = ctx.transform_expression(expression);
    let call = lua::Expression::call(lua::Expression::identifier("error"), vec![value, lua::Expression::number(0.0)]);
    vec![lua::Statement::expression(call).with_position(ctx.position(statement.pos))]
}

/// `function(e) ... end` for the catch clause, with its binding destructured.
fn transform_catch_function(ctx: &mut TransformationContext<'_>, clause: &CatchClause) -> (lua::Expression, bool) {
    let (params, mut prologue) = match &clause.binding {
        Some(BindingName::Identifier(ident)) => (vec![transform_identifier(ctx, ident)], Vec::new()),
        Some(pattern) => {
            let parameter = lua::Identifier::new("____bindingPattern0");
            let table = lua::Expression::from(parameter.clone());
            let (mut preceding, bindings) = ctx.run_in_new_frame(|ctx| transform_binding_pattern(ctx, pattern, table));
            preceding.extend(bindings);
            (vec![parameter], preceding)
        }
        None => (Vec::new(), Vec::new()),
    };
    let (block, scope) = transform_scope_block(ctx, &clause.block, ScopeKind::CATCH);
    prologue.extend(block.statements);
    let function = lua::Expression::function(params, false, lua::Block::new(prologue)).with_position(ctx.position(clause.pos));
    (function, scope.function_returned)
}

pub fn transform_try(
    ctx: &mut TransformationContext<'_>,
    statement: &Statement,
    try_block: &[Statement],
    catch_clause: Option<&CatchClause>,
    finally_block: Option<&[Statement]>,
) -> Vec<lua::Statement> {
    let position = ctx.position(statement.pos);
    let try_result = lua::Identifier::temp("____try");
    let returned = lua::Identifier::temp("____hasReturned");
    let return_value = lua::Identifier::temp("____returnValue");
    let catch_function = lua::Identifier::temp("____catch");
    let not_try = || lua::Expression::unary(UnaryOperator::Not, lua::Expression::from(try_result.clone()));

    let mut result = Vec::new();
    let (try_body, try_scope) = transform_scope_block(ctx, try_block, ScopeKind::TRY);
    let mut has_return = try_scope.function_returned;
    if let Some(clause) = catch_clause {
        let (function, catch_returned) = transform_catch_function(ctx, clause);
        has_return |= catch_returned;
        result.push(lua::Statement::local(vec![catch_function.clone()], vec![function]));
    }

    let mut results = vec![try_result.clone(), returned.clone()];
    if has_return {
        results.push(return_value.clone());
    }
    let pcall = lua::Expression::call(
        lua::Expression::identifier("pcall"),
        vec![lua::Expression::function(Vec::new(), false, try_body)],
    );
    result.push(lua::Statement::local(results, vec![pcall]).with_position(position));

    if catch_clause.is_some() {
        // The second pcall result is the error when the call failed.
        let call = lua::Expression::call(
            lua::Expression::from(catch_function),
            vec![lua::Expression::from(returned.clone())],
        );
        let handler = if has_return {
            lua::Statement::assign(
                vec![lua::Expression::from(returned.clone()), lua::Expression::from(return_value.clone())],
                vec![call],
            )
        } else {
            lua::Statement::expression(call)
        };
        result.push(lua::Statement::if_then(not_try(), lua::Block::new(vec![handler]), None));
    }

    if let Some(finally_block) = finally_block {
        let (block, _) = transform_scope_block(ctx, finally_block, ScopeKind::BLOCK);
        result.extend(block.statements);
    }

    if catch_clause.is_none() {
        // Nothing handled the error; raise it again once finally ran.
        let rethrow = lua::Expression::call(
            lua::Expression::identifier("error"),
            vec![lua::Expression::from(returned.clone()), lua::Expression::number(0.0)],
        );
        result.push(lua::Statement::if_then(
            not_try(),
            lua::Block::new(vec![lua::Statement::expression(rethrow)]),
            None,
        ));
    }

    if has_return {
        let forward = create_return_statement(ctx, vec![lua::Expression::from(return_value)], position);
        result.push(lua::Statement::if_then(
            lua::Expression::from(returned),
            lua::Block::new(vec![forward]),
            None,
        ));
    }

    vec![lua::Statement::do_block(result).with_position(position)]
}
