//! Imports and the file body.
//!
//! Imports produce no statement where they appear. They are collected on
//! the enclosing scope and hoisting puts them at its top, so bindings are
//! available to hoisted functions too:
//!
//! ```text
//! import { a as b } from "./m";      local ____m = require("./m")
//! import * as ns from "./n";         local b = ____m.a
//! import "./side";                   local ns = require("./n")
//!                                    require("./side")
//! ```

use super::identifier::transform_identifier;
use crate::context::TransformationContext;
use crate::lua_ast_utils::{EXPORTS_NAME, create_exports_identifier};
use crate::scope::{ScopeKind, perform_hoisting};
use crate::source::{Ident, ImportClause, NamedImports, Statement};
use tracing::debug;
use tslua_ast as lua;
use tslua_ast::names::create_safe_name;

fn create_module_require(module_specifier: &str) -> lua::Expression {
    lua::Expression::call(
        lua::Expression::identifier("require"),
        vec![lua::Expression::string(module_specifier)],
    )
}

/// Import bindings only used as types are dropped.
fn should_be_imported(ctx: &TransformationContext<'_>, ident: &Ident) -> bool {
    ident.symbol.is_none_or(|symbol| ctx.resolver.is_referenced_alias(symbol))
}

/// `____<basename>`, the local holding the required module table.
fn module_table_name(module_specifier: &str) -> lua::Identifier {
    let path = module_specifier.replace('"', "");
    let basename = path.rsplit(['/', '\\']).next().unwrap_or(&path);
    lua::Identifier::new(create_safe_name(basename))
}

pub fn transform_import(
    ctx: &mut TransformationContext<'_>,
    statement: &Statement,
    module_specifier: &str,
    clause: Option<&ImportClause>,
) -> Vec<lua::Statement> {
    let position = ctx.position(statement.pos);
    let require = create_module_require(module_specifier).with_position(position);

    let Some(clause) = clause else {
        let side_effect = lua::Statement::expression(require).with_position(position);
        ctx.peek_scope_mut().import_statements.push(side_effect);
        return Vec::new();
    };

    let module_table = module_table_name(module_specifier);
    let mut result = Vec::new();
    let mut uses_module_table = false;

    // import d from "m" -> local d = ____m.default
    if let Some(default) = &clause.default
        && should_be_imported(ctx, default)
    {
        let name = transform_identifier(ctx, default);
        let value = lua::Expression::property(lua::Expression::from(module_table.clone()), "default");
        result.push(lua::Statement::local(vec![name], vec![value]).with_position(ctx.position(default.pos)));
        uses_module_table = true;
    }

    match &clause.named {
        Some(NamedImports::Namespace(ident)) if should_be_imported(ctx, ident) => {
            let name = transform_identifier(ctx, ident);
            result.push(lua::Statement::local(vec![name], vec![require.clone()]).with_position(position));
        }
        Some(NamedImports::Named(specifiers)) => {
            for specifier in specifiers {
                if !should_be_imported(ctx, &specifier.name) {
                    continue;
                }
                let name = transform_identifier(ctx, &specifier.name);
                let property = specifier.property_name.as_deref().unwrap_or(&specifier.name.text);
                let value = lua::Expression::table_index(
                    lua::Expression::from(module_table.clone()),
                    lua::Expression::string(property),
                );
                result.push(lua::Statement::local(vec![name], vec![value]).with_position(ctx.position(specifier.pos)));
                uses_module_table = true;
            }
        }
        _ => {}
    }

    if result.is_empty() {
        return Vec::new();
    }
    if uses_module_table {
        result.insert(0, lua::Statement::local(vec![module_table], vec![require]).with_position(position));
    }
    debug!(module = module_specifier, statements = result.len(), "import");
    ctx.peek_scope_mut().import_statements.extend(result);
    Vec::new()
}

/// The whole file in a `FILE` scope; modules build and return `____exports`.
pub fn transform_source_file(ctx: &mut TransformationContext<'_>) -> lua::File {
    let file = ctx.file;
    ctx.push_scope(ScopeKind::FILE);
    let statements = ctx.transform_statements(&file.statements);
    let mut statements = perform_hoisting(ctx, statements);
    ctx.pop_scope();

    if ctx.is_module {
        statements.insert(
            0,
            lua::Statement::local(vec![lua::Identifier::new(EXPORTS_NAME)], vec![lua::Expression::table(Vec::new())]),
        );
        statements.push(lua::Statement::ret(vec![create_exports_identifier()]));
    }

    let mut lua_file = lua::File::new(statements);
    lua_file.trivia = file.shebang().to_string();
    lua_file
}
