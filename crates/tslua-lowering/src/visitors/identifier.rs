use crate::context::TransformationContext;
use crate::lua_ast_utils::{create_exported_identifier, is_exported_identifier};
use crate::source::Ident;
use tslua_ast as lua;
use tslua_ast::names::{create_safe_name, is_unsafe_name, is_valid_lua_identifier};
use tslua_common::diagnostics::diagnostic_messages;

/// Lower a binding or reference, tracking its symbol.
///
/// Locals whose names Lua cannot use (keywords, invalid characters, shadowed
/// builtins) are renamed to `____<name>`. Unresolved globals keep their name
/// and must already be valid.
pub fn transform_identifier(ctx: &mut TransformationContext<'_>, ident: &Ident) -> lua::Identifier {
    let symbol_id = ctx.identifier_symbol_id(ident);
    let position = ctx.position(ident.pos);
    let allow_unicode = ctx.lua_target.allows_unicode_identifiers();

    let mut identifier = lua::Identifier::new(ident.text.clone())
        .with_symbol(symbol_id)
        .with_position(position);
    match ident.symbol {
        Some(symbol) => {
            let exported = ctx.is_module && ctx.resolver.is_exported(symbol);
            if !exported && is_unsafe_name(&ident.text, allow_unicode) {
                identifier.text = create_safe_name(&ident.text);
                identifier.original_name = Some(ident.text.clone());
            }
        }
        None => {
            if !is_valid_lua_identifier(&ident.text, allow_unicode) {
                ctx.diagnose(
                    ident.pos,
                    &diagnostic_messages::INVALID_AMBIENT_IDENTIFIER_NAME,
                    &[&ident.text],
                );
            }
        }
    }
    identifier
}

/// Identifier in expression position: exported module bindings read through
/// `____exports`, and `undefined` is `nil`.
pub fn transform_identifier_expression(ctx: &mut TransformationContext<'_>, ident: &Ident) -> lua::Expression {
    if ident.symbol.is_none() && ident.text == "undefined" {
        return lua::Expression::nil().with_position(ctx.position(ident.pos));
    }
    let identifier = transform_identifier(ctx, ident);
    if is_exported_identifier(ctx, &identifier) {
        return create_exported_identifier(&identifier);
    }
    lua::Expression::from(identifier)
}
