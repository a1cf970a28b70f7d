//! `while`, `do ... while`, `for`, `for ... of` and `continue`.
//!
//! Lua has no `continue`; it jumps to a label placed after the body, which
//! is wrapped in its own `do ... end` so the label sits outside every local
//! the body declares:
//!
//! ```text
//! while c do                   while c do
//!     if x then continue end       do
//!     f()                              if x then goto __continue3 end
//! end                                  f()
//!                                  end
//!                                  ::__continue3::
//!                              end
//! ```
//!
//! A condition that needs preceding statements has to re-run them on every
//! iteration, so it moves into the body as `if not cond then break end`.

use super::assignment::transform_assignment;
use super::identifier::transform_identifier;
use super::statements::{transform_block_or_statement, transform_expression_as_statements};
use super::variable::{check_variable_declaration_list, transform_binding_pattern, transform_variable_declaration};
use crate::context::TransformationContext;
use crate::lua_ast_utils::{DeclarationOrigin, invert_condition};
use crate::scope::{ScopeKind, perform_hoisting};
use crate::source::{BindingName, Expression, ForInitializer, Statement, SyntaxKind};
use tracing::trace;
use tslua_ast as lua;

fn continue_label(scope_id: Option<u32>) -> String {
    match scope_id {
        Some(id) => format!("__continue{id}"),
        None => "__continue".to_string(),
    }
}

/// Loop body in its own scope, followed by the `continue` label when used.
pub fn transform_loop_body(ctx: &mut TransformationContext<'_>, body: &Statement) -> Vec<lua::Statement> {
    ctx.push_scope(ScopeKind::LOOP);
    let statements = transform_block_or_statement(ctx, body);
    let statements = perform_hoisting(ctx, statements);
    let scope = ctx.pop_scope();
    if !scope.loop_continued {
        return statements;
    }
    trace!(scope = scope.id, "loop body continued");
    vec![
        lua::Statement::do_block(statements),
        lua::Statement::label(continue_label(Some(scope.id))),
    ]
}

/// A lowered loop condition and the statements it needs each iteration.
struct LoopCondition {
    preceding: Vec<lua::Statement>,
    condition: lua::Expression,
}

impl LoopCondition {
    fn lower(ctx: &mut TransformationContext<'_>, condition: &Expression) -> Self {
        let (preceding, condition) = ctx.run_in_new_frame(|ctx| ctx.transform_expression(condition));
        LoopCondition { preceding, condition }
    }

    /// `while` condition; preceding statements become a guarded head of `body`.
    fn into_while_condition(self, body: &mut Vec<lua::Statement>) -> lua::Expression {
        if self.preceding.is_empty() {
            return self.condition;
        }
        let position = self.condition.position;
        let mut head = self.preceding;
        head.push(
            lua::Statement::if_then(
                invert_condition(self.condition),
                lua::Block::new(vec![lua::Statement::break_loop()]),
                None,
            )
            .with_position(position),
        );
        body.splice(0..0, head);
        lua::Expression::boolean(true)
    }
}

pub fn transform_while(
    ctx: &mut TransformationContext<'_>,
    statement: &Statement,
    condition: &Expression,
    body: &Statement,
) -> Vec<lua::Statement> {
    let condition = LoopCondition::lower(ctx, condition);
    let mut body = transform_loop_body(ctx, body);
    let condition = condition.into_while_condition(&mut body);
    vec![lua::Statement::while_loop(condition, lua::Block::new(body)).with_position(ctx.position(statement.pos))]
}

/// `repeat do body end until not cond`
pub fn transform_do_while(
    ctx: &mut TransformationContext<'_>,
    statement: &Statement,
    body: &Statement,
    condition: &Expression,
) -> Vec<lua::Statement> {
    let mut statements = vec![lua::Statement::do_block(transform_loop_body(ctx, body))];
    let LoopCondition { preceding, condition } = LoopCondition::lower(ctx, condition);
    let until = if preceding.is_empty() {
        invert_condition(condition)
    } else {
        // repeat ...; <preceding>; if not cond then break end until false
        let position = condition.position;
        statements.extend(preceding);
        statements.push(
            lua::Statement::if_then(
                invert_condition(condition),
                lua::Block::new(vec![lua::Statement::break_loop()]),
                None,
            )
            .with_position(position),
        );
        lua::Expression::boolean(false)
    };
    vec![lua::Statement::repeat_until(lua::Block::new(statements), until).with_position(ctx.position(statement.pos))]
}

/// `do <init>; while cond do body; <incrementor> end end`
pub fn transform_for(
    ctx: &mut TransformationContext<'_>,
    statement: &Statement,
    initializer: Option<&ForInitializer>,
    condition: Option<&Expression>,
    incrementor: Option<&Expression>,
    body: &Statement,
) -> Vec<lua::Statement> {
    ctx.push_scope(ScopeKind::LOOP_INITIALIZER);
    let mut result = Vec::new();
    match initializer {
        Some(ForInitializer::Declarations(list)) => {
            check_variable_declaration_list(ctx, list);
            for declaration in &list.declarations {
                let origin = DeclarationOrigin {
                    position: ctx.position(declaration.pos),
                    ..DeclarationOrigin::default()
                };
                let (preceding, declarations) =
                    ctx.run_in_new_frame(|ctx| transform_variable_declaration(ctx, declaration, origin));
                result.extend(preceding);
                result.extend(declarations);
            }
        }
        Some(ForInitializer::Expression(expression)) => {
            result.extend(transform_expression_as_statements(ctx, expression));
        }
        None => {}
    }

    let condition = condition.map(|condition| LoopCondition::lower(ctx, condition));
    let mut body = transform_loop_body(ctx, body);
    let condition = match condition {
        Some(condition) => condition.into_while_condition(&mut body),
        None => lua::Expression::boolean(true),
    };
    if let Some(incrementor) = incrementor {
        body.extend(transform_expression_as_statements(ctx, incrementor));
    }
    let position = ctx.position(statement.pos);
    result.push(lua::Statement::while_loop(condition, lua::Block::new(body)).with_position(position));

    let result = perform_hoisting(ctx, result);
    ctx.pop_scope();
    vec![lua::Statement::do_block(result).with_position(position)]
}

/// `for ____, x in ipairs(arr) do ... end`
///
/// Patterns and plain assignment targets receive the element through
/// `____value` at the top of the body.
pub fn transform_for_of(
    ctx: &mut TransformationContext<'_>,
    statement: &Statement,
    initializer: &ForInitializer,
    expression: &Expression,
    body: &Statement,
) -> Vec<lua::Statement> {
    let iterable = ctx.transform_expression(expression);
    let value = lua::Identifier::temp("____value");

    ctx.push_scope(ScopeKind::LOOP_INITIALIZER);
    let (control, mut prologue) = match initializer {
        ForInitializer::Declarations(list) => {
            check_variable_declaration_list(ctx, list);
            match list.declarations.first().map(|declaration| &declaration.name) {
                Some(BindingName::Identifier(ident)) => (transform_identifier(ctx, ident), Vec::new()),
                Some(pattern) => {
                    let table = lua::Expression::from(value.clone());
                    let (mut preceding, bindings) =
                        ctx.run_in_new_frame(|ctx| transform_binding_pattern(ctx, pattern, table));
                    preceding.extend(bindings);
                    (value, preceding)
                }
                None => (lua::Identifier::temp("____"), Vec::new()),
            }
        }
        ForInitializer::Expression(target) => {
            let source = lua::Expression::from(value.clone());
            let (mut preceding, assignment) =
                ctx.run_in_new_frame(|ctx| transform_assignment(ctx, target, source, false, target.pos));
            preceding.extend(assignment);
            (value, preceding)
        }
    };
    ctx.pop_scope();

    prologue.extend(transform_loop_body(ctx, body));
    let position = ctx.position(statement.pos);
    let ipairs = lua::Expression::call(lua::Expression::identifier("ipairs"), vec![iterable]);
    vec![
        lua::Statement::for_in(vec![lua::Identifier::temp("____"), control], vec![ipairs], lua::Block::new(prologue))
            .with_position(position),
    ]
}

pub fn transform_continue(
    ctx: &mut TransformationContext<'_>,
    statement: &Statement,
    label: Option<&str>,
) -> Vec<lua::Statement> {
    if !ctx.lua_target.supports_goto() {
        ctx.diagnose_unsupported_for_target(statement.pos, "Continue statement");
    }
    if label.is_some() {
        ctx.diagnose_unsupported_kind(statement.pos, SyntaxKind::ContinueStatement);
    }
    let scope_id = ctx.find_scope_mut(ScopeKind::LOOP).map(|scope| {
        scope.loop_continued = true;
        scope.id
    });
    vec![lua::Statement::goto(continue_label(scope_id)).with_position(ctx.position(statement.pos))]
}
