//! Numeric, template, array and object literals.

use crate::context::TransformationContext;
use crate::expression_list::{transform_expression_list, transform_ordered_expressions};
use crate::lua_ast_utils::wrap_in_to_string_for_concat;
use crate::resolver::TypeFacts;
use crate::source::{Expression, ObjectMember, PropertyName, TemplateSpan};
use tslua_ast::{self as lua, BinaryOperator, UnaryOperator};
use tslua_common::{LuaLibFeature, SourcePosition};

pub fn transform_numeric_literal(value: f64, position: Option<SourcePosition>) -> lua::Expression {
    if value.is_nan() {
        return lua::Expression::binary(
            lua::Expression::number(0.0),
            BinaryOperator::Division,
            lua::Expression::number(0.0),
        )
        .with_position(position);
    }
    if value.is_infinite() {
        let huge = lua::Expression::property(lua::Expression::identifier("math"), "huge");
        let huge = if value < 0.0 {
            lua::Expression::unary(UnaryOperator::Negation, huge)
        } else {
            huge
        };
        return huge.with_position(position);
    }
    lua::Expression::number(value).with_position(position)
}

/// Table key for a property name; computed names are lowered in place.
pub fn transform_property_name(ctx: &mut TransformationContext<'_>, name: &PropertyName) -> lua::Expression {
    match name {
        PropertyName::Identifier(text) | PropertyName::String(text) => lua::Expression::string(text.clone()),
        PropertyName::Numeric(value) => lua::Expression::number(*value),
        PropertyName::Computed(expression) => ctx.transform_expression(expression),
    }
}

/// `` `a${x}b` `` -> `"a" .. tostring(x) .. "b"`
pub fn transform_template(
    ctx: &mut TransformationContext<'_>,
    expression: &Expression,
    head: &str,
    spans: &[TemplateSpan],
) -> lua::Expression {
    let position = ctx.position(expression.pos);
    let mut parts = Vec::with_capacity(spans.len() * 2 + 1);
    if !head.is_empty() {
        parts.push(lua::Expression::string(head).with_position(position));
    }

    let span_expressions: Vec<&Expression> = spans.iter().map(|span| &span.expression).collect();
    let lowered = transform_ordered_expressions(ctx, &span_expressions);
    for (span, part) in spans.iter().zip(lowered) {
        if ctx.type_facts(span.expression.id).contains(TypeFacts::STRING) {
            parts.push(part);
        } else {
            parts.push(wrap_in_to_string_for_concat(part));
        }
        if !span.literal.is_empty() {
            parts.push(lua::Expression::string(span.literal.clone()));
        }
    }

    parts
        .into_iter()
        .reduce(|left, right| lua::Expression::binary(left, BinaryOperator::Concat, right))
        .unwrap_or_else(|| lua::Expression::string(""))
        .with_position(position)
}

pub fn transform_array_literal(
    ctx: &mut TransformationContext<'_>,
    expression: &Expression,
    elements: &[Expression],
) -> lua::Expression {
    let values = transform_expression_list(ctx, elements);
    lua::Expression::table_of(values).with_position(ctx.position(expression.pos))
}

enum ObjectPart {
    Fields(Vec<lua::TableField>),
    Spread(lua::Expression),
}

/// Object literals become keyed tables; spreads merge through `__TS__ObjectAssign`.
pub fn transform_object_literal(
    ctx: &mut TransformationContext<'_>,
    expression: &Expression,
    members: &[ObjectMember],
) -> lua::Expression {
    let position = ctx.position(expression.pos);

    // Everything with side effects, in source order: computed keys, values, spreads.
    let mut evaluated: Vec<&Expression> = Vec::new();
    for member in members {
        match member {
            ObjectMember::Property { name, value } => {
                if let PropertyName::Computed(key) = name {
                    evaluated.push(key);
                }
                evaluated.push(value);
            }
            ObjectMember::Spread(value) => evaluated.push(value),
            ObjectMember::Shorthand(_) => {}
        }
    }
    let mut lowered = transform_ordered_expressions(ctx, &evaluated).into_iter();

    let mut parts: Vec<ObjectPart> = Vec::new();
    let mut fields = Vec::new();
    for member in members {
        match member {
            ObjectMember::Property { name, .. } => {
                let key = match name {
                    PropertyName::Computed(_) => lowered.next().expect("computed key was lowered"),
                    name => transform_property_name(ctx, name),
                };
                let value = lowered.next().expect("property value was lowered");
                fields.push(lua::TableField::keyed(key, value));
            }
            ObjectMember::Shorthand(ident) => {
                let value = super::identifier::transform_identifier_expression(ctx, ident);
                fields.push(lua::TableField::keyed(lua::Expression::string(ident.text.clone()), value));
            }
            ObjectMember::Spread(_) => {
                if !fields.is_empty() {
                    parts.push(ObjectPart::Fields(std::mem::take(&mut fields)));
                }
                parts.push(ObjectPart::Spread(lowered.next().expect("spread was lowered")));
            }
        }
    }

    if parts.is_empty() {
        return lua::Expression::table(fields).with_position(position);
    }
    if !fields.is_empty() {
        parts.push(ObjectPart::Fields(fields));
    }
    // The first argument is the target and must be a fresh table.
    let mut params = Vec::with_capacity(parts.len() + 1);
    if !matches!(parts.first(), Some(ObjectPart::Fields(_))) {
        params.push(lua::Expression::table(Vec::new()));
    }
    params.extend(parts.into_iter().map(|part| match part {
        ObjectPart::Fields(fields) => lua::Expression::table(fields),
        ObjectPart::Spread(value) => value,
    }));
    ctx.lualib_call(LuaLibFeature::ObjectAssign, params, position)
}
