use super::*;
use crate::builder::SourceBuilder;
use crate::resolver::SymbolTable;
use crate::source::SourceFile;
use crate::visitors::VisitorMap;
use smallvec::smallvec;
use tslua_common::CompilerOptions;

fn empty_file() -> (SourceFile, SymbolTable) {
    SourceBuilder::new().finish("a.ts", Vec::new())
}

fn declaration(ctx: &mut TransformationContext<'_>, name: &str, value: Option<f64>) -> (lua::Statement, StatementId) {
    let id = ctx.next_statement_id();
    let statement = lua::Statement::local(
        vec![lua::Identifier::new(name)],
        value.map(lua::Expression::number).into_iter().collect(),
    )
    .with_id(id);
    (statement, id)
}

fn call(name: &str) -> lua::Statement {
    lua::Statement::expression(lua::Expression::call(lua::Expression::identifier(name), Vec::new()))
}

#[test]
fn test_reference_count_tracks_each_use() {
    let mut scope = Scope::new(1, ScopeKind::BLOCK);
    let symbol = SymbolId(3);
    assert_eq!(scope.reference_count(symbol), 0);

    scope.referenced_symbols.entry(symbol).or_default().push(4);
    scope.referenced_symbols.entry(symbol).or_default().push(9);
    assert_eq!(scope.reference_count(symbol), 2);
    assert_eq!(scope.reference_count(SymbolId(4)), 0);
}

#[test]
fn test_switch_scope_hoists_every_declaration() {
    let (file, table) = empty_file();
    let options = CompilerOptions::default();
    let visitors = VisitorMap::standard();
    let mut ctx = TransformationContext::new(&file, &table, &options, &visitors);

    ctx.push_scope(ScopeKind::SWITCH);
    let (statement, id) = declaration(&mut ctx, "y", Some(1.0));
    ctx.peek_scope_mut().add_variable_declaration(id, smallvec![SymbolId(1)]);

    let hoisted = perform_hoisting(&mut ctx, vec![statement, call("f")]);
    ctx.pop_scope();

    assert_eq!(hoisted.len(), 3);
    assert_eq!(
        hoisted[0].kind,
        lua::StatementKind::VariableDeclaration {
            left: vec![lua::Identifier::new("y")],
            right: Vec::new(),
        }
    );
    assert_eq!(
        hoisted[1].kind,
        lua::StatementKind::Assignment {
            left: vec![lua::Expression::identifier("y")],
            right: vec![lua::Expression::number(1.0)],
        }
    );
    assert_eq!(hoisted[2], call("f"));
}

#[test]
fn test_hoisted_declaration_without_value_is_removed() {
    let (file, table) = empty_file();
    let options = CompilerOptions::default();
    let visitors = VisitorMap::standard();
    let mut ctx = TransformationContext::new(&file, &table, &options, &visitors);

    ctx.push_scope(ScopeKind::SWITCH);
    let (statement, id) = declaration(&mut ctx, "y", None);
    ctx.peek_scope_mut().add_variable_declaration(id, smallvec![SymbolId(1)]);

    let separated = separate_hoisted_statements(&mut ctx, vec![statement]);
    assert!(separated.statements.is_empty());
    assert!(separated.hoisted_statements.is_empty());
    assert_eq!(separated.hoisted_identifiers, vec![lua::Identifier::new("y")]);
}

#[test]
fn test_imports_come_first() {
    let (file, table) = empty_file();
    let options = CompilerOptions::default();
    let visitors = VisitorMap::standard();
    let mut ctx = TransformationContext::new(&file, &table, &options, &visitors);

    ctx.push_scope(ScopeKind::FILE);
    let import = lua::Statement::expression(lua::Expression::call(
        lua::Expression::identifier("require"),
        vec![lua::Expression::string("./side")],
    ));
    ctx.peek_scope_mut().import_statements.push(import.clone());

    let hoisted = perform_hoisting(&mut ctx, vec![call("f")]);
    assert_eq!(hoisted, vec![import, call("f")]);
    // Imports are handed out once.
    assert!(ctx.peek_scope().import_statements.is_empty());
}

#[test]
fn test_declaration_outside_statement_list_is_skipped() {
    let (file, table) = empty_file();
    let options = CompilerOptions::default();
    let visitors = VisitorMap::standard();
    let mut ctx = TransformationContext::new(&file, &table, &options, &visitors);

    ctx.push_scope(ScopeKind::SWITCH);
    let (_, id) = declaration(&mut ctx, "nested", Some(2.0));
    ctx.peek_scope_mut().add_variable_declaration(id, smallvec![SymbolId(1)]);

    let hoisted = perform_hoisting(&mut ctx, vec![call("f")]);
    assert_eq!(hoisted, vec![call("f")]);
}

#[test]
fn test_unknown_symbol_is_not_hoisted_outside_switch() {
    let (file, table) = empty_file();
    let options = CompilerOptions::default();
    let visitors = VisitorMap::standard();
    let mut ctx = TransformationContext::new(&file, &table, &options, &visitors);

    ctx.push_scope(ScopeKind::BLOCK);
    let (statement, id) = declaration(&mut ctx, "y", Some(1.0));
    ctx.peek_scope_mut().add_variable_declaration(id, smallvec![SymbolId(7)]);

    let hoisted = perform_hoisting(&mut ctx, vec![statement.clone()]);
    assert_eq!(hoisted, vec![statement]);
}
