//! Construct visitors and the override chain.
//!
//! # Architecture
//!
//! Every source node kind is handled by the standard visitor, an exhaustive
//! `match` in [`standard_expression`] / [`standard_statement`]. Embedders can
//! register overrides per [`SyntaxKind`]; the most recently registered
//! override runs first and may delegate to the one registered before it via
//! [`TransformationContext::super_transform_expression`], ending at the
//! standard visitor.
//!
//! The position in the chain travels with the call as a copyable
//! [`VisitorChain`], so nested lowering of other nodes (which starts at the
//! top of their own chain) never disturbs it.

pub mod access;
pub mod assignment;
pub mod binary;
pub mod compound;
pub mod conditional;
pub mod errors;
pub mod function;
pub mod identifier;
pub mod literals;
pub mod loops;
pub mod modules;
pub mod optional;
pub mod statements;
pub mod switch;
pub mod variable;

use crate::context::TransformationContext;
use crate::source::{Expression, ExpressionKind, Statement, StatementKind, SyntaxKind};
use rustc_hash::FxHashMap;
use tslua_ast as lua;
use tslua_common::diagnostics::diagnostic_messages;

pub type ExpressionVisitor =
    fn(&mut TransformationContext<'_>, &Expression, VisitorChain) -> lua::Expression;
pub type StatementVisitor =
    fn(&mut TransformationContext<'_>, &Statement, VisitorChain) -> Vec<lua::Statement>;

/// Position of the running handler in a node kind's override chain.
///
/// Position 0 is the standard visitor; overrides occupy 1..=n.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisitorChain {
    pub kind: SyntaxKind,
    pub position: usize,
}

impl VisitorChain {
    /// The handler registered before this one.
    ///
    /// # Panics
    ///
    /// When called from the standard visitor, which has nothing before it.
    pub fn previous(self) -> VisitorChain {
        assert!(
            self.position > 0,
            "There is no super transform for {} visitor",
            self.kind
        );
        VisitorChain {
            kind: self.kind,
            position: self.position - 1,
        }
    }
}

#[derive(Default)]
pub struct VisitorMap {
    expressions: FxHashMap<SyntaxKind, Vec<ExpressionVisitor>>,
    statements: FxHashMap<SyntaxKind, Vec<StatementVisitor>>,
}

impl VisitorMap {
    /// Only the standard visitors.
    pub fn standard() -> Self {
        VisitorMap::default()
    }

    pub fn with_expression_override(mut self, kind: SyntaxKind, visitor: ExpressionVisitor) -> Self {
        self.expressions.entry(kind).or_default().push(visitor);
        self
    }

    pub fn with_statement_override(mut self, kind: SyntaxKind, visitor: StatementVisitor) -> Self {
        self.statements.entry(kind).or_default().push(visitor);
        self
    }

    /// Chain token for the most recently registered handler of `kind`.
    pub fn expression_chain(&self, kind: SyntaxKind) -> VisitorChain {
        VisitorChain {
            kind,
            position: self.expressions.get(&kind).map_or(0, Vec::len),
        }
    }

    pub fn statement_chain(&self, kind: SyntaxKind) -> VisitorChain {
        VisitorChain {
            kind,
            position: self.statements.get(&kind).map_or(0, Vec::len),
        }
    }

    pub fn expression_visitor(&self, chain: VisitorChain) -> ExpressionVisitor {
        match chain.position {
            0 => standard_expression,
            position => self.expressions[&chain.kind][position - 1],
        }
    }

    pub fn statement_visitor(&self, chain: VisitorChain) -> StatementVisitor {
        match chain.position {
            0 => standard_statement,
            position => self.statements[&chain.kind][position - 1],
        }
    }
}

/// Standard lowering of every expression kind.
pub fn standard_expression(
    ctx: &mut TransformationContext<'_>,
    expression: &Expression,
    _chain: VisitorChain,
) -> lua::Expression {
    let position = ctx.position(expression.pos);
    match &expression.kind {
        ExpressionKind::Identifier(ident) => identifier::transform_identifier_expression(ctx, ident),
        ExpressionKind::This => lua::Expression::from(crate::lua_ast_utils::create_self_identifier()).with_position(position),
        ExpressionKind::Null | ExpressionKind::Undefined => lua::Expression::nil().with_position(position),
        ExpressionKind::True => lua::Expression::boolean(true).with_position(position),
        ExpressionKind::False => lua::Expression::boolean(false).with_position(position),
        ExpressionKind::Numeric(value) => literals::transform_numeric_literal(*value, position),
        ExpressionKind::String(value) => lua::Expression::string(value.clone()).with_position(position),
        ExpressionKind::Template { head, spans } => literals::transform_template(ctx, expression, head, spans),
        ExpressionKind::Array(elements) => literals::transform_array_literal(ctx, expression, elements),
        ExpressionKind::Object(members) => literals::transform_object_literal(ctx, expression, members),
        ExpressionKind::Spread(inner) => access::transform_spread(ctx, expression, inner),
        ExpressionKind::Parenthesized(inner) => ctx.transform_expression(inner),
        ExpressionKind::PropertyAccess { expression: object, name } => {
            access::transform_property_access(ctx, expression, object, name)
        }
        ExpressionKind::ElementAccess {
            expression: object,
            argument,
        } => access::transform_element_access(ctx, expression, object, argument),
        ExpressionKind::Call { callee, arguments } => access::transform_call(ctx, expression, callee, arguments),
        ExpressionKind::Prefix { operator, operand } => binary::transform_prefix(ctx, expression, *operator, operand),
        ExpressionKind::Postfix { operator, operand } => binary::transform_postfix(ctx, expression, *operator, operand),
        ExpressionKind::Binary { operator, left, right } => {
            binary::transform_binary(ctx, expression, *operator, left, right)
        }
        ExpressionKind::Conditional {
            condition,
            when_true,
            when_false,
        } => conditional::transform_conditional(ctx, expression, condition, when_true, when_false),
        ExpressionKind::Function(function) => function::transform_function_expression(ctx, function),
        ExpressionKind::OptionalChain {
            expression: left,
            continuation,
        } => optional::transform_optional_chain(ctx, expression, left, continuation),
        ExpressionKind::OptionalContinuation => optional::transform_optional_continuation(ctx, expression),
        ExpressionKind::Unsupported { kind } => {
            ctx.diagnose(expression.pos, &diagnostic_messages::UNSUPPORTED_NODE_KIND, &[kind]);
            lua::Expression::nil()
        }
    }
}

/// Standard lowering of every statement kind.
pub fn standard_statement(
    ctx: &mut TransformationContext<'_>,
    statement: &Statement,
    _chain: VisitorChain,
) -> Vec<lua::Statement> {
    match &statement.kind {
        StatementKind::Variable { list, modifiers, jsdoc } => {
            variable::transform_variable_statement(ctx, statement, list, *modifiers, jsdoc.as_deref())
        }
        StatementKind::Function { function, jsdoc, .. } => {
            function::transform_function_declaration(ctx, statement, function, jsdoc.as_deref())
        }
        StatementKind::Expression(expression) => statements::transform_expression_statement(ctx, expression),
        StatementKind::Return(expression) => statements::transform_return(ctx, statement, expression.as_ref()),
        StatementKind::If {
            condition,
            then_statement,
            else_statement,
        } => conditional::transform_if(ctx, statement, condition, then_statement, else_statement.as_deref()),
        StatementKind::Block(statements) => statements::transform_block(ctx, statement, statements),
        StatementKind::While { condition, body } => loops::transform_while(ctx, statement, condition, body),
        StatementKind::DoWhile { body, condition } => loops::transform_do_while(ctx, statement, body, condition),
        StatementKind::For {
            initializer,
            condition,
            incrementor,
            body,
        } => loops::transform_for(
            ctx,
            statement,
            initializer.as_ref(),
            condition.as_ref(),
            incrementor.as_ref(),
            body,
        ),
        StatementKind::ForOf {
            initializer,
            expression,
            body,
        } => loops::transform_for_of(ctx, statement, initializer, expression, body),
        StatementKind::Switch { expression, clauses } => switch::transform_switch(ctx, statement, expression, clauses),
        StatementKind::Break => vec![lua::Statement::break_loop().with_position(ctx.position(statement.pos))],
        StatementKind::Continue { label } => loops::transform_continue(ctx, statement, label.as_deref()),
        StatementKind::Throw(expression) => errors::transform_throw(ctx, statement, expression),
        StatementKind::Try {
            try_block,
            catch_clause,
            finally_block,
        } => errors::transform_try(
            ctx,
            statement,
            try_block,
            catch_clause.as_ref(),
            finally_block.as_deref(),
        ),
        StatementKind::Import {
            module_specifier,
            clause,
        } => modules::transform_import(ctx, statement, module_specifier, clause.as_ref()),
        StatementKind::Empty => Vec::new(),
        StatementKind::Unsupported { kind } => {
            ctx.diagnose(statement.pos, &diagnostic_messages::UNSUPPORTED_NODE_KIND, &[kind]);
            Vec::new()
        }
    }
}

#[cfg(test)]
#[path = "../../tests/visitors.rs"]
mod tests;
