use super::*;
use crate::builder::SourceBuilder;
use crate::resolver::SymbolFlags;
use crate::source::{Ident, SourceFile};
use crate::visitors::VisitorMap;
use crate::SymbolTable;
use tslua_common::CompilerOptions;

fn x() -> lua::Expression {
    lua::Expression::identifier("x")
}

fn options_for(target: LuaTarget) -> CompilerOptions {
    CompilerOptions {
        lua_target: target,
        ..CompilerOptions::default()
    }
}

/// A file declaring `x`, exported when `exported` is set.
fn file_with_x(exported: bool) -> (SourceFile, SymbolTable, Ident) {
    let b = SourceBuilder::new();
    let flags = if exported { SymbolFlags::EXPORTED } else { SymbolFlags::empty() };
    let symbol = b.symbol("x", flags);
    let mut statement = b.let_(symbol, None);
    if exported {
        statement = b.exported(statement);
    }
    let ident = b.ident(symbol);
    let (file, table) = b.finish("a.ts", vec![statement]);
    (file, table, ident)
}

#[test]
fn test_add_to_numeric_folds_literals() {
    assert_eq!(add_to_numeric_expression(lua::Expression::number(1.0), 1.0), lua::Expression::number(2.0));
    assert_eq!(add_to_numeric_expression(x(), 0.0), x());

    let decremented = lua::Expression::binary(x(), BinaryOperator::Subtraction, lua::Expression::number(1.0));
    assert_eq!(add_to_numeric_expression(decremented, 1.0), x());

    let incremented = lua::Expression::binary(x(), BinaryOperator::Addition, lua::Expression::number(2.0));
    assert_eq!(add_to_numeric_expression(incremented, -2.0), x());

    assert_eq!(
        add_to_numeric_expression(x(), -2.0),
        lua::Expression::binary(x(), BinaryOperator::Subtraction, lua::Expression::number(2.0))
    );
    assert_eq!(
        add_to_numeric_expression(x(), 1.0),
        lua::Expression::binary(x(), BinaryOperator::Addition, lua::Expression::number(1.0))
    );
}

#[test]
fn test_invert_condition_unwraps_not() {
    let negated = lua::Expression::unary(UnaryOperator::Not, x());
    assert_eq!(invert_condition(negated.clone()), x());
    assert_eq!(invert_condition(x()), negated);
}

#[test]
fn test_wrap_in_to_string_skips_strings() {
    assert_eq!(
        wrap_in_to_string_for_concat(x()),
        lua::Expression::call(lua::Expression::identifier("tostring"), vec![x()])
    );
    let literal = lua::Expression::string("a");
    assert_eq!(wrap_in_to_string_for_concat(literal.clone()), literal);
    let concat = lua::Expression::binary(literal, BinaryOperator::Concat, x());
    assert_eq!(wrap_in_to_string_for_concat(concat.clone()), concat);
}

#[test]
fn test_jsdoc_comments_become_ldoc_lines() {
    assert_eq!(jsdoc_comments("The answer"), vec![lua::Comment::Line("- The answer".to_string())]);
    assert_eq!(
        jsdoc_comments("@param x"),
        vec![
            lua::Comment::Line("-".to_string()),
            lua::Comment::Line(" @param x".to_string()),
        ]
    );
    assert_eq!(
        jsdoc_comments("First\n   Second"),
        vec![
            lua::Comment::Line("- First".to_string()),
            lua::Comment::Line(" Second".to_string()),
        ]
    );
    assert!(jsdoc_comments("   ").is_empty());
}

#[test]
fn test_unpack_call_depends_on_target() {
    let (file, table) = SourceBuilder::new().finish("a.ts", Vec::new());
    let visitors = VisitorMap::standard();
    let t = || lua::Expression::identifier("t");

    let options = options_for(LuaTarget::Lua51);
    let mut ctx = TransformationContext::new(&file, &table, &options, &visitors);
    let call = create_unpack_call(&mut ctx, t(), None);
    assert!(call.has_flags(lua::NodeFlags::TABLE_UNPACK_CALL));
    assert_eq!(
        call,
        lua::Expression::call(lua::Expression::identifier("unpack"), vec![t()])
            .set_flags(lua::NodeFlags::TABLE_UNPACK_CALL)
    );

    let options = options_for(LuaTarget::Lua54);
    let mut ctx = TransformationContext::new(&file, &table, &options, &visitors);
    let call = create_unpack_call(&mut ctx, t(), None);
    let lua::ExpressionKind::Call { expression, .. } = &call.kind else {
        panic!("expected a call");
    };
    assert_eq!(**expression, lua::Expression::property(lua::Expression::identifier("table"), "unpack"));

    let options = options_for(LuaTarget::Universal);
    let mut ctx = TransformationContext::new(&file, &table, &options, &visitors);
    let call = create_unpack_call(&mut ctx, t(), None);
    assert_eq!(
        call,
        lua::Expression::call(lua::Expression::identifier("__TS__Unpack"), vec![t()])
    );
    let (features, _) = ctx.into_output();
    assert!(features.contains(&LuaLibFeature::Unpack));
}

#[test]
fn test_hoistable_declaration_registers_symbols_only() {
    let (file, table) = SourceBuilder::new().finish("a.ts", Vec::new());
    let options = CompilerOptions::default();
    let visitors = VisitorMap::standard();
    let mut ctx = TransformationContext::new(&file, &table, &options, &visitors);
    ctx.push_scope(ScopeKind::BLOCK);

    let temp = create_hoistable_variable_declaration(&mut ctx, lua::Identifier::temp("____t"), None, None);
    assert_eq!(temp.id, None);

    let symbol = ctx.next_symbol_id();
    let named = lua::Identifier::new("y").with_symbol(Some(symbol));
    let declaration = create_hoistable_variable_declaration(&mut ctx, named, Some(x()), None);
    let scope = ctx.peek_scope();
    assert_eq!(scope.variable_declarations.len(), 1);
    assert_eq!(Some(scope.variable_declarations[0].statement), declaration.id);
    assert_eq!(scope.variable_declarations[0].symbols.as_slice(), &[symbol]);
}

#[test]
fn test_exported_declaration_assigns_into_exports() {
    let (file, table, ident) = file_with_x(true);
    let options = CompilerOptions::default();
    let visitors = VisitorMap::standard();
    let mut ctx = TransformationContext::new(&file, &table, &options, &visitors);
    ctx.push_scope(ScopeKind::FILE);
    let symbol = ctx.identifier_symbol_id(&ident);
    let lhs = || vec![lua::Identifier::new("x").with_symbol(symbol)];

    let statements = create_local_or_exported_or_global_declaration(
        &mut ctx,
        lhs(),
        vec![lua::Expression::number(1.0)],
        DeclarationOrigin::default(),
    );
    assert_eq!(
        statements,
        vec![lua::Statement::assign(
            vec![lua::Expression::property(create_exports_identifier(), "x")],
            vec![lua::Expression::number(1.0)],
        )]
    );

    let without_value =
        create_local_or_exported_or_global_declaration(&mut ctx, lhs(), Vec::new(), DeclarationOrigin::default());
    assert!(without_value.is_empty());
}

#[test]
fn test_script_top_level_declares_globals() {
    let (file, table, ident) = file_with_x(false);
    let options = CompilerOptions::default();
    let visitors = VisitorMap::standard();
    let mut ctx = TransformationContext::new(&file, &table, &options, &visitors);
    ctx.push_scope(ScopeKind::FILE);
    let symbol = ctx.identifier_symbol_id(&ident);

    let global = lua::Identifier::new("x").with_symbol(symbol);
    let statements = create_local_or_exported_or_global_declaration(
        &mut ctx,
        vec![global.clone()],
        vec![lua::Expression::number(1.0)],
        DeclarationOrigin::default(),
    );
    assert_eq!(
        statements,
        vec![lua::Statement::assign(
            vec![lua::Expression::from(global)],
            vec![lua::Expression::number(1.0)]
        )]
    );
}

#[test]
fn test_nested_declaration_is_local() {
    let (file, table, ident) = file_with_x(false);
    let options = CompilerOptions::default();
    let visitors = VisitorMap::standard();
    let mut ctx = TransformationContext::new(&file, &table, &options, &visitors);
    ctx.push_scope(ScopeKind::FILE);
    ctx.push_scope(ScopeKind::BLOCK);
    let symbol = ctx.identifier_symbol_id(&ident);

    let origin = DeclarationOrigin {
        jsdoc: Some("Counter"),
        ..DeclarationOrigin::default()
    };
    let statements = create_local_or_exported_or_global_declaration(
        &mut ctx,
        vec![lua::Identifier::new("x").with_symbol(symbol)],
        vec![lua::Expression::number(1.0)],
        origin,
    );
    assert_eq!(statements.len(), 1);
    assert_eq!(
        statements[0].kind,
        lua::StatementKind::VariableDeclaration {
            left: vec![lua::Identifier::new("x").with_symbol(symbol)],
            right: vec![lua::Expression::number(1.0)],
        }
    );
    assert_eq!(statements[0].leading_comments, vec![lua::Comment::Line("- Counter".to_string())]);
    assert_eq!(ctx.peek_scope().variable_declarations.len(), 1);
}

#[test]
fn test_referenced_binding_is_declared_ahead_of_its_value() {
    let (file, table, ident) = file_with_x(false);
    let options = CompilerOptions::default();
    let visitors = VisitorMap::standard();
    let mut ctx = TransformationContext::new(&file, &table, &options, &visitors);
    ctx.push_scope(ScopeKind::FILE);
    ctx.push_scope(ScopeKind::BLOCK);
    let symbol = ctx.identifier_symbol_id(&ident);
    // A second use, as in `const x = () => x`.
    ctx.identifier_symbol_id(&ident);
    let lhs = vec![lua::Identifier::new("x").with_symbol(symbol)];

    let (preceding, statements) = ctx.run_in_new_frame(|ctx| {
        create_local_or_exported_or_global_declaration(
            ctx,
            lhs.clone(),
            vec![lua::Expression::number(1.0)],
            DeclarationOrigin::default(),
        )
    });
    assert_eq!(preceding.len(), 1);
    assert_eq!(
        preceding[0].kind,
        lua::StatementKind::VariableDeclaration {
            left: lhs.clone(),
            right: Vec::new(),
        }
    );
    assert_eq!(
        statements,
        vec![lua::Statement::assign(
            lhs.into_iter().map(lua::Expression::from).collect(),
            vec![lua::Expression::number(1.0)],
        )]
    );
}
