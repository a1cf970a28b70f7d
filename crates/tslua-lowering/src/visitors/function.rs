//! Function declarations, function expressions and arrows.
//!
//! # Architecture
//!
//! Parameters are lowered in the enclosing scope, the body in a fresh
//! `FUNCTION` scope. The body goes first: the header (defaults, the rest
//! table, parameter destructuring) depends on what the body referenced.
//!
//! ```text
//! function f(a = 1, { b }, ...rest)      function f(self, a, ____bindingPattern0, ...)
//!                                            if a == nil then a = 1 end
//!                                            local rest = {...}
//!                                            local b = ____bindingPattern0.b
//!                                            ...
//! ```
//!
//! Declarations record the symbols their body references in the enclosing
//! scope, which hoisting uses to decide whether a variable the function
//! captures has to move above it.

use super::identifier::transform_identifier;
use super::statements::create_return_statement;
use super::variable::{create_default_assignment, transform_binding_pattern};
use crate::context::TransformationContext;
use crate::lua_ast_utils::{
    DeclarationOrigin, create_local_or_exported_or_global_declaration, create_self_identifier, wrap_in_table,
};
use crate::resolver::ContextType;
use crate::scope::{FunctionDefinitionInfo, Scope, ScopeKind, perform_hoisting};
use crate::source::{BindingName, FunctionBody, FunctionKind, FunctionLike, Parameter, Statement};
use tracing::debug;
use tslua_ast as lua;
use tslua_common::LuaTarget;

/// A declared `this` parameter only types the context; it takes no slot.
fn is_this_parameter(parameter: &Parameter) -> bool {
    matches!(&parameter.name, BindingName::Identifier(ident) if ident.text == "this")
}

fn binding_pattern_name(index: usize) -> lua::Identifier {
    lua::Identifier::new(format!("____bindingPattern{index}"))
}

struct LoweredParameters {
    names: Vec<lua::Identifier>,
    dots: bool,
    rest: Option<lua::Identifier>,
}

fn transform_parameters(ctx: &mut TransformationContext<'_>, function: &FunctionLike) -> LoweredParameters {
    let mut names = Vec::with_capacity(function.parameters.len() + 1);
    if ctx.resolver.context_type(function.id) == ContextType::NonVoid {
        match function.kind {
            // Arrows ignore the context but still receive it.
            FunctionKind::Arrow => {
                if !function.parameters.is_empty() {
                    names.push(lua::Identifier::temp("____"));
                }
            }
            _ => names.push(create_self_identifier()),
        }
    }

    let mut rest = None;
    let mut pattern_index = 0;
    for parameter in function.parameters.iter().filter(|parameter| !is_this_parameter(parameter)) {
        let name = match &parameter.name {
            BindingName::Identifier(ident) => transform_identifier(ctx, ident),
            _ => {
                pattern_index += 1;
                binding_pattern_name(pattern_index - 1)
            }
        };
        if parameter.rest {
            rest = Some(name);
        } else {
            names.push(name);
        }
    }
    LoweredParameters {
        names,
        dots: rest.is_some(),
        rest,
    }
}

/// Unused rest parameters do not pay for the table.
fn is_rest_parameter_referenced(identifier: &lua::Identifier, scope: &Scope) -> bool {
    match identifier.symbol_id {
        Some(symbol) => scope.reference_count(symbol) > 0,
        None => true,
    }
}

/// Defaults, then the rest table, then parameter destructuring.
fn transform_function_body_header(
    ctx: &mut TransformationContext<'_>,
    function: &FunctionLike,
    rest: Option<&lua::Identifier>,
) -> Vec<lua::Statement> {
    let mut header = Vec::new();
    let mut pattern_declarations = Vec::new();
    let mut pattern_index = 0;
    for parameter in function.parameters.iter().filter(|parameter| !is_this_parameter(parameter)) {
        let position = ctx.position(parameter.pos);
        match &parameter.name {
            BindingName::Identifier(ident) => {
                if let Some(initializer) = &parameter.initializer {
                    let target = lua::Expression::from(transform_identifier(ctx, ident));
                    let (preceding, default) = ctx.run_in_new_frame(|ctx| ctx.transform_expression(initializer));
                    header.push(create_default_assignment(target, preceding, default).with_position(position));
                }
            }
            pattern => {
                let identifier = binding_pattern_name(pattern_index);
                pattern_index += 1;
                let table = lua::Expression::from(identifier);
                if let Some(initializer) = &parameter.initializer {
                    let (preceding, default) = ctx.run_in_new_frame(|ctx| ctx.transform_expression(initializer));
                    header.push(create_default_assignment(table.clone(), preceding, default).with_position(position));
                }
                let (preceding, bindings) = ctx.run_in_new_frame(|ctx| transform_binding_pattern(ctx, pattern, table));
                pattern_declarations.extend(preceding);
                pattern_declarations.extend(bindings);
            }
        }
    }

    if let Some(rest) = rest
        && is_rest_parameter_referenced(rest, ctx.peek_scope())
    {
        // Lua 5.0 collects varargs into the implicit `arg` table.
        let table = if ctx.lua_target == LuaTarget::Lua50 {
            lua::Expression::new(lua::ExpressionKind::Arg)
        } else {
            wrap_in_table(vec![lua::Expression::dots()])
        };
        header.push(lua::Statement::local(vec![rest.clone()], vec![table]));
    }
    header.extend(pattern_declarations);
    header
}

fn transform_function_body(
    ctx: &mut TransformationContext<'_>,
    function: &FunctionLike,
    rest: Option<&lua::Identifier>,
) -> (Vec<lua::Statement>, Scope) {
    ctx.push_scope(ScopeKind::FUNCTION);
    let body = match &function.body {
        FunctionBody::Block(statements) => {
            let statements = ctx.transform_statements(statements);
            perform_hoisting(ctx, statements)
        }
        FunctionBody::Expression(expression) => {
            let position = ctx.position(expression.pos);
            let (mut statements, value) = ctx.run_in_new_frame(|ctx| ctx.transform_expression(expression));
            statements.push(create_return_statement(ctx, vec![value], position));
            statements
        }
    };
    let mut statements = transform_function_body_header(ctx, function, rest);
    let scope = ctx.pop_scope();
    statements.extend(body);
    (statements, scope)
}

fn transform_function_to_expression(ctx: &mut TransformationContext<'_>, function: &FunctionLike) -> (lua::Expression, Scope) {
    let parameters = transform_parameters(ctx, function);
    let (body, scope) = transform_function_body(ctx, function, parameters.rest.as_ref());

    let mut flags = lua::NodeFlags::empty();
    if matches!(function.body, FunctionBody::Expression(_)) {
        flags |= lua::NodeFlags::INLINE;
    }
    if function.kind == FunctionKind::Declaration {
        flags |= lua::NodeFlags::DECLARATION;
    }
    let expression = lua::Expression::function(parameters.names, parameters.dots, lua::Block::new(body))
        .set_flags(flags)
        .with_position(ctx.position(function.pos));
    (expression, scope)
}

/// Function expression or arrow.
///
/// A named function expression that calls itself is bound to its name first
/// (`local function f() ... end`), since Lua function literals are anonymous.
pub fn transform_function_expression(ctx: &mut TransformationContext<'_>, function: &FunctionLike) -> lua::Expression {
    let (expression, scope) = transform_function_to_expression(ctx, function);
    if let Some(name) = &function.name
        && let Some(symbol) = name.symbol
        && let Some(id) = ctx.known_symbol_id(symbol)
        && scope.reference_count(id) > 0
    {
        let identifier = transform_identifier(ctx, name);
        let position = expression.position;
        ctx.add_preceding_statement(lua::Statement::local(vec![identifier.clone()], vec![expression]).with_position(position));
        return lua::Expression::from(identifier);
    }
    expression
}

pub fn transform_function_declaration(
    ctx: &mut TransformationContext<'_>,
    statement: &Statement,
    function: &FunctionLike,
    jsdoc: Option<&str>,
) -> Vec<lua::Statement> {
    let (expression, scope) = transform_function_to_expression(ctx, function);
    let name = match &function.name {
        Some(ident) => transform_identifier(ctx, ident),
        None => lua::Identifier::temp("____"),
    };

    if let Some(symbol) = name.symbol_id.filter(|id| !id.is_temp()) {
        debug!(name = %name.text, references = scope.referenced_symbols.len(), "function definition");
        ctx.peek_scope_mut().function_definitions.insert(
            symbol,
            FunctionDefinitionInfo {
                definition: None,
                definition_pos: Some(statement.pos),
                referenced_symbols: scope.referenced_symbols.keys().copied().collect(),
            },
        );
    }

    let origin = DeclarationOrigin {
        position: ctx.position(statement.pos),
        is_function_declaration: true,
        jsdoc,
    };
    create_local_or_exported_or_global_declaration(ctx, vec![name], vec![expression], origin)
}
