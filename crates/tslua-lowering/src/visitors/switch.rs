//! `switch` as a `repeat ... until true` block.
//!
//! # Architecture
//!
//! `break` already leaves a `repeat` loop, so the whole switch becomes one
//! iteration of it. Each clause with statements is guarded by an accumulated
//! `____condN`: once a case matched, every following clause runs until one
//! breaks, which is exactly fallthrough.
//!
//! ```text
//! switch (x) {             repeat
//!     case 1:                  local ____switch3 = x
//!     case 2:                  local ____cond3 = ____switch3 == 1 or ____switch3 == 2
//!         f();                 if ____cond3 then
//!     case 3:                      f()
//!         g();                 end
//!         break;               ____cond3 = ____cond3 or ____switch3 == 3
//!     default:                 if ____cond3 then
//!         h();                     g()
//! }                                break
//!                              end
//!                              do
//!                                  h()
//!                              end
//!                          until true
//! ```
//!
//! Clauses run in the same Lua block, so every declaration of the switch is
//! hoisted to its top. A `default` reached by no case is lowered once more
//! at the end, together with the clauses it falls through into.

use super::binary::create_short_circuit_preceding_statements;
use crate::context::TransformationContext;
use crate::scope::{HoistedStatements, ScopeKind, separate_hoisted_statements};
use crate::source::{BinaryOperator, CaseClause, Expression, Statement};
use std::mem;
use tracing::trace;
use tslua_ast as lua;

/// `left or right`, short-circuiting `right`'s preceding statements.
fn create_or_expression(
    ctx: &mut TransformationContext<'_>,
    left: lua::Expression,
    right: lua::Expression,
    right_preceding: Vec<lua::Statement>,
    pos: u32,
) -> (Vec<lua::Statement>, lua::Expression) {
    if right_preceding.is_empty() {
        return (Vec::new(), lua::Expression::binary(left, lua::BinaryOperator::Or, right));
    }
    create_short_circuit_preceding_statements(ctx, left, right, right_preceding, BinaryOperator::BarBar, pos)
}

/// Accumulated match condition of the clauses since the last emitted `if`.
#[derive(Default)]
struct PendingCondition {
    preceding: Vec<lua::Statement>,
    condition: Option<lua::Expression>,
}

impl PendingCondition {
    /// Add `switch == test` to the pending condition.
    fn coalesce(&mut self, ctx: &mut TransformationContext<'_>, switch_variable: &lua::Identifier, test: &Expression) {
        let (preceding, value) = ctx.run_in_new_frame(|ctx| ctx.transform_expression(test));
        let comparison = lua::Expression::binary(
            lua::Expression::from(switch_variable.clone()),
            lua::BinaryOperator::Equality,
            value,
        );
        let condition = match self.condition.take() {
            Some(condition) => {
                let (preceding, condition) = create_or_expression(ctx, condition, comparison, preceding, test.pos);
                self.preceding.extend(preceding);
                condition
            }
            None => {
                self.preceding.extend(preceding);
                comparison
            }
        };
        self.condition = Some(condition);
    }

    fn take(&mut self) -> (Vec<lua::Statement>, Option<lua::Expression>) {
        (mem::take(&mut self.preceding), self.condition.take())
    }
}

#[derive(Default)]
struct SwitchOutput {
    statements: Vec<lua::Statement>,
    hoisted_statements: Vec<lua::Statement>,
    hoisted_identifiers: Vec<lua::Identifier>,
}

impl SwitchOutput {
    fn hoist(&mut self, separated: &mut HoistedStatements) {
        self.hoisted_statements.append(&mut separated.hoisted_statements);
        self.hoisted_identifiers.append(&mut separated.hoisted_identifiers);
    }
}

fn transform_clause_statements(ctx: &mut TransformationContext<'_>, clause: &CaseClause) -> HoistedStatements {
    let statements = ctx.transform_statements(&clause.statements);
    separate_hoisted_statements(ctx, statements)
}

pub fn transform_switch(
    ctx: &mut TransformationContext<'_>,
    statement: &Statement,
    expression: &Expression,
    clauses: &[CaseClause],
) -> Vec<lua::Statement> {
    let position = ctx.position(statement.pos);
    let switch_value = ctx.transform_expression(expression);

    let scope_id = ctx.push_scope(ScopeKind::SWITCH).id;
    let switch_variable = lua::Identifier::temp(format!("____switch{scope_id}"));
    let condition_variable = lua::Identifier::temp(format!("____cond{scope_id}"));
    let condition_expression = || lua::Expression::from(condition_variable.clone());
    let mut output = SwitchOutput::default();

    if let [only] = clauses
        && only.test.is_none()
    {
        if !only.statements.is_empty() {
            let mut separated = transform_clause_statements(ctx, only);
            output.hoist(&mut separated);
            output.statements.push(lua::Statement::do_block(separated.statements));
        }
    } else {
        let mut default_transformed = false;
        let mut is_initial_condition = true;
        let mut pending = PendingCondition::default();

        for (i, clause) in clauses.iter().enumerate() {
            let is_last = i + 1 == clauses.len();
            match &clause.test {
                None => {
                    // Handled by the final default code path.
                    if i == 0 || Statement::contains_break_or_return(&clauses[i - 1].statements) {
                        continue;
                    }
                    if is_initial_condition {
                        let (preceding, condition) = pending.take();
                        output.statements.extend(preceding);
                        let condition = condition.unwrap_or_else(|| lua::Expression::boolean(false));
                        output
                            .statements
                            .push(lua::Statement::local(vec![condition_variable.clone()], vec![condition]));
                        is_initial_condition = false;
                    }
                    if is_last {
                        // Still evaluate the cases skipped on the way here.
                        let (preceding, condition) = pending.take();
                        if let Some(condition) = condition {
                            let (or_preceding, condition) =
                                create_or_expression(ctx, condition_expression(), condition, preceding, clause.pos);
                            output.statements.extend(or_preceding);
                            output
                                .statements
                                .push(lua::Statement::assign(vec![condition_expression()], vec![condition]));
                        }
                        continue;
                    }
                }
                Some(test) => {
                    pending.coalesce(ctx, &switch_variable, test);
                    // Empty clauses fall into the next one.
                    if !is_last && clause.statements.is_empty() {
                        continue;
                    }
                    let (preceding, condition) = pending.take();
                    let condition = condition.unwrap_or_else(|| lua::Expression::boolean(false));
                    if is_initial_condition {
                        output.statements.extend(preceding);
                        output
                            .statements
                            .push(lua::Statement::local(vec![condition_variable.clone()], vec![condition]));
                    } else {
                        let (or_preceding, condition) =
                            create_or_expression(ctx, condition_expression(), condition, preceding, clause.pos);
                        output.statements.extend(or_preceding);
                        output
                            .statements
                            .push(lua::Statement::assign(vec![condition_expression()], vec![condition]));
                    }
                    is_initial_condition = false;
                }
            }

            let mut separated = transform_clause_statements(ctx, clause);
            if is_last && !Statement::contains_break_or_return(&clause.statements) {
                separated.statements.push(lua::Statement::break_loop());
            }
            output.hoist(&mut separated);
            if clause.test.is_none() {
                default_transformed = true;
            }
            output.statements.push(
                lua::Statement::if_then(condition_expression(), lua::Block::new(separated.statements), None)
                    .with_position(ctx.position(clause.pos)),
            );
            // Cases left pending before a default reach it through the final
            // default path, never through the next case's condition.
            pending = PendingCondition::default();
        }

        // No case matched: run the default and whatever it falls into.
        if let Some(start) = clauses.iter().position(|clause| clause.test.is_none()) {
            let end = clauses[start..]
                .iter()
                .position(|clause| Statement::contains_break_or_return(&clause.statements))
                .map_or(clauses.len(), |offset| start + offset + 1);
            trace!(scope = scope_id, start, end, "switch default fallthrough");

            let mut separated = transform_clause_statements(ctx, &clauses[start]);
            // The default was lowered above already; its hoisted parts are in.
            if !default_transformed {
                output.hoist(&mut separated);
            }
            let mut default_statements = separated.statements;
            for clause in &clauses[start + 1..end] {
                default_statements.extend(transform_clause_statements(ctx, clause).statements);
            }
            if !default_statements.is_empty() {
                output.statements.push(lua::Statement::do_block(default_statements));
            }
        }
    }

    ctx.pop_scope();

    let mut body = Vec::with_capacity(output.statements.len() + output.hoisted_statements.len() + 2);
    body.push(lua::Statement::local(vec![switch_variable], vec![switch_value]));
    if !output.hoisted_identifiers.is_empty() {
        body.push(lua::Statement::local(output.hoisted_identifiers, Vec::new()));
    }
    body.extend(output.hoisted_statements);
    body.extend(output.statements);
    vec![lua::Statement::repeat_until(lua::Block::new(body), lua::Expression::boolean(true)).with_position(position)]
}
