//! `let`/`const` declarations and destructuring.
//!
//! Array patterns of plain identifiers map onto Lua multiple assignment:
//!
//! ```text
//! const [a, b = 1] = xs      local a, b = unpack(xs)
//!                            if b == nil then b = 1 end
//! ```
//!
//! Everything else (object patterns, nesting, rest elements) reads each
//! binding out of the initializer, cached in a temp, one path at a time.

use super::identifier::transform_identifier;
use super::literals::transform_property_name;
use crate::context::TransformationContext;
use crate::expression_list::{move_to_preceding_temp, transform_expression_list};
use crate::lua_ast_utils::{
    DeclarationOrigin, create_exported_identifier, create_local_or_exported_or_global_declaration,
    create_unpack_call, is_exported_identifier,
};
use crate::source::{
    BindingElement, BindingName, DeclarationKind, DeclarationList, Expression, ExpressionKind, Modifiers,
    PropertyName, Statement, VariableDeclaration,
};
use tslua_ast::{self as lua, BinaryOperator};
use tslua_common::LuaLibFeature;
use tslua_common::diagnostics::diagnostic_messages;

/// `var` has function scoping and is rejected.
pub fn check_variable_declaration_list(ctx: &mut TransformationContext<'_>, list: &DeclarationList) {
    if list.kind == DeclarationKind::Var {
        ctx.diagnose(list.pos, &diagnostic_messages::UNSUPPORTED_VAR_DECLARATION, &[]);
    }
}

/// Where a binding is written: `____exports.x` for exports, `x` otherwise.
fn assignment_target(ctx: &TransformationContext<'_>, identifier: lua::Identifier) -> lua::Expression {
    if is_exported_identifier(ctx, &identifier) {
        create_exported_identifier(&identifier)
    } else {
        lua::Expression::from(identifier)
    }
}

/// `if target == nil then <preceding>; target = default end`
pub(crate) fn create_default_assignment(
    target: lua::Expression,
    mut preceding: Vec<lua::Statement>,
    default: lua::Expression,
) -> lua::Statement {
    let condition = lua::Expression::binary(target.clone(), BinaryOperator::Equality, lua::Expression::nil());
    preceding.push(lua::Statement::assign(vec![target], vec![default]));
    lua::Statement::if_then(condition, lua::Block::new(preceding), None)
}

/// Key under which an object pattern element is stored.
fn element_property_name<'s>(element: &'s BindingElement) -> Option<PropertyNameRef<'s>> {
    match (&element.property_name, &element.name) {
        (Some(name), _) => Some(PropertyNameRef::Name(name)),
        (None, BindingName::Identifier(ident)) => Some(PropertyNameRef::Text(&ident.text)),
        (None, _) => None,
    }
}

enum PropertyNameRef<'s> {
    Name(&'s PropertyName),
    Text(&'s str),
}

/// `{ [name] = true, ... }` for every property an object rest leaves out.
fn excluded_properties_table(elements: &[BindingElement]) -> lua::Expression {
    let fields = elements
        .iter()
        .filter(|element| !element.rest)
        .filter_map(|element| match (&element.property_name, &element.name) {
            (Some(PropertyName::Identifier(text)), _) => Some(text.clone()),
            (None, BindingName::Identifier(ident)) => Some(ident.text.clone()),
            _ => None,
        })
        .map(|name| lua::TableField::keyed(lua::Expression::string(name), lua::Expression::boolean(true)))
        .collect();
    lua::Expression::table(fields)
}

/// Declare every binding of `pattern`, reading the values out of `table`.
pub fn transform_binding_pattern(
    ctx: &mut TransformationContext<'_>,
    pattern: &BindingName,
    table: lua::Expression,
) -> Vec<lua::Statement> {
    let mut result = Vec::new();
    match pattern {
        BindingName::Identifier(ident) => {
            let identifier = transform_identifier(ctx, ident);
            let position = ctx.position(ident.pos);
            result.extend(create_local_or_exported_or_global_declaration(
                ctx,
                vec![identifier],
                vec![table],
                DeclarationOrigin {
                    position,
                    ..DeclarationOrigin::default()
                },
            ));
        }
        BindingName::Array(elements) => {
            let count = elements.len();
            for (index, element) in elements.iter().enumerate() {
                let Some(element) = element else { continue };
                let key = lua::Expression::number((index + 1) as f64);
                let value = if element.rest {
                    if index != count - 1 {
                        continue;
                    }
                    let position = ctx.position(element.pos);
                    ctx.lualib_call(
                        LuaLibFeature::ArraySlice,
                        vec![table.clone(), lua::Expression::number(index as f64)],
                        position,
                    )
                } else {
                    lua::Expression::table_index(table.clone(), key)
                };
                result.extend(transform_binding_element(ctx, element, value));
            }
        }
        BindingName::Object(elements) => {
            let count = elements.len();
            for (index, element) in elements.iter().enumerate() {
                let value = if element.rest {
                    if index != count - 1 {
                        continue;
                    }
                    let position = ctx.position(element.pos);
                    let excluded = excluded_properties_table(elements);
                    ctx.lualib_call(LuaLibFeature::ObjectRest, vec![table.clone(), excluded], position)
                } else {
                    let Some(name) = element_property_name(element) else { continue };
                    // Computed keys keep their side effects in pattern order.
                    let (preceding, key) = ctx.run_in_new_frame(|ctx| match name {
                        PropertyNameRef::Name(name) => transform_property_name(ctx, name),
                        PropertyNameRef::Text(text) => lua::Expression::string(text),
                    });
                    result.extend(preceding);
                    lua::Expression::table_index(table.clone(), key)
                };
                result.extend(transform_binding_element(ctx, element, value));
            }
        }
    }
    result
}

/// One element of a pattern whose value is `value`.
fn transform_binding_element(
    ctx: &mut TransformationContext<'_>,
    element: &BindingElement,
    value: lua::Expression,
) -> Vec<lua::Statement> {
    let ident = match &element.name {
        BindingName::Identifier(ident) => ident,
        nested => {
            let Some(initializer) = &element.initializer else {
                return transform_binding_pattern(ctx, nested, value);
            };
            // local ____bindingPattern = value; if nil then default; then the nested bindings
            let temp = lua::Identifier::temp(ctx.create_temp_name(Some("bindingPattern")));
            let target = lua::Expression::from(temp.clone());
            let (preceding, default) = ctx.run_in_new_frame(|ctx| ctx.transform_expression(initializer));
            let mut result = vec![
                lua::Statement::local(vec![temp], vec![value]),
                create_default_assignment(target.clone(), preceding, default),
            ];
            result.extend(transform_binding_pattern(ctx, nested, target));
            return result;
        }
    };
    let identifier = transform_identifier(ctx, ident);
    let position = ctx.position(element.pos);
    let mut result = create_local_or_exported_or_global_declaration(
        ctx,
        vec![identifier.clone()],
        vec![value],
        DeclarationOrigin {
            position,
            ..DeclarationOrigin::default()
        },
    );
    if let Some(initializer) = &element.initializer {
        let target = assignment_target(ctx, identifier);
        let (preceding, default) = ctx.run_in_new_frame(|ctx| ctx.transform_expression(initializer));
        result.push(create_default_assignment(target, preceding, default).with_position(position));
    }
    result
}

/// Nested patterns and `rest` rule out the multiple-assignment form.
fn is_complex_array_element(element: &Option<BindingElement>) -> bool {
    element
        .as_ref()
        .is_some_and(|element| element.rest || !matches!(element.name, BindingName::Identifier(_)))
}

fn transform_array_binding_element(
    ctx: &mut TransformationContext<'_>,
    element: &Option<BindingElement>,
) -> lua::Identifier {
    match element {
        Some(BindingElement {
            name: BindingName::Identifier(ident),
            ..
        }) => transform_identifier(ctx, ident),
        Some(element) => {
            let temp = lua::Identifier::temp(ctx.create_temp_name(Some("bindingPattern")));
            let statements = transform_binding_pattern(ctx, &element.name, lua::Expression::from(temp.clone()));
            ctx.add_preceding_statements(statements);
            temp
        }
        None => lua::Identifier::temp("____"),
    }
}

fn transform_binding_variable_declaration(
    ctx: &mut TransformationContext<'_>,
    pattern: &BindingName,
    initializer: Option<&Expression>,
    origin: DeclarationOrigin<'_>,
) -> Vec<lua::Statement> {
    let mut statements = Vec::new();
    let simple_elements = match pattern {
        BindingName::Array(elements) if !elements.iter().any(is_complex_array_element) => elements,
        _ => {
            let table = match initializer {
                Some(initializer) => {
                    let expression = ctx.transform_expression(initializer);
                    let (moves, moved) =
                        ctx.run_in_new_frame(|ctx| move_to_preceding_temp(ctx, expression, Some(initializer)));
                    statements.extend(moves);
                    moved
                }
                None => lua::Expression::from(lua::Identifier::temp("____")),
            };
            statements.extend(transform_binding_pattern(ctx, pattern, table));
            return statements;
        }
    };

    let names = if simple_elements.is_empty() {
        vec![lua::Identifier::temp("____")]
    } else {
        simple_elements
            .iter()
            .map(|element| transform_array_binding_element(ctx, element))
            .collect()
    };
    let values = match initializer.map(Expression::skip_outer) {
        // Array literals need no table round trip.
        Some(Expression {
            kind: ExpressionKind::Array(elements),
            ..
        }) if !elements.is_empty() => transform_expression_list(ctx, elements),
        Some(Expression {
            kind: ExpressionKind::Array(_),
            ..
        })
        | None => vec![lua::Expression::nil()],
        Some(initializer) => {
            let lowered = ctx.transform_expression(initializer);
            let position = ctx.position(initializer.pos);
            vec![create_unpack_call(ctx, lowered, position)]
        }
    };
    statements.extend(create_local_or_exported_or_global_declaration(ctx, names, values, origin));

    for element in simple_elements.iter().flatten() {
        let (Some(default), BindingName::Identifier(ident)) = (&element.initializer, &element.name) else {
            continue;
        };
        let identifier = transform_identifier(ctx, ident);
        let target = assignment_target(ctx, identifier);
        let (preceding, default) = ctx.run_in_new_frame(|ctx| ctx.transform_expression(default));
        let position = ctx.position(element.pos);
        statements.push(create_default_assignment(target, preceding, default).with_position(position));
    }
    statements
}

/// Lower one declarator. The name is lowered before the initializer so a
/// self-referencing initializer sees the binding as already referenced.
pub fn transform_variable_declaration(
    ctx: &mut TransformationContext<'_>,
    declaration: &VariableDeclaration,
    origin: DeclarationOrigin<'_>,
) -> Vec<lua::Statement> {
    match &declaration.name {
        BindingName::Identifier(ident) => {
            let identifier = transform_identifier(ctx, ident);
            let value = declaration
                .initializer
                .as_ref()
                .map(|initializer| ctx.transform_expression(initializer));
            create_local_or_exported_or_global_declaration(ctx, vec![identifier], value.into_iter().collect(), origin)
        }
        pattern => transform_binding_variable_declaration(ctx, pattern, declaration.initializer.as_ref(), origin),
    }
}

pub fn transform_variable_statement(
    ctx: &mut TransformationContext<'_>,
    statement: &Statement,
    list: &DeclarationList,
    modifiers: Modifiers,
    jsdoc: Option<&str>,
) -> Vec<lua::Statement> {
    if modifiers.declare {
        return Vec::new();
    }
    check_variable_declaration_list(ctx, list);
    let mut result = Vec::new();
    for (i, declaration) in list.declarations.iter().enumerate() {
        let pos = if i == 0 { statement.pos } else { declaration.pos };
        let origin = DeclarationOrigin {
            position: ctx.position(pos),
            is_function_declaration: false,
            jsdoc: if i == 0 { jsdoc } else { None },
        };
        result.extend(transform_variable_declaration(ctx, declaration, origin));
    }
    result
}
