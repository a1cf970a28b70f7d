use super::*;
use crate::builder::SourceBuilder;
use crate::resolver::{SymbolFlags, SymbolTable};
use tslua_common::diagnostics::diagnostic_codes;

fn empty_file() -> (SourceFile, SymbolTable) {
    SourceBuilder::new().finish("a.ts", Vec::new())
}

fn marker(name: &str) -> lua::Statement {
    lua::Statement::expression(lua::Expression::identifier(name))
}

#[test]
fn test_frames_collect_their_own_statements() {
    let (file, table) = empty_file();
    let options = CompilerOptions::default();
    let visitors = VisitorMap::standard();
    let mut ctx = TransformationContext::new(&file, &table, &options, &visitors);

    let (outer, inner) = ctx.run_in_new_frame(|ctx| {
        ctx.add_preceding_statement(marker("a"));
        let (inner, ()) = ctx.run_in_new_frame(|ctx| ctx.add_preceding_statement(marker("b")));
        ctx.add_preceding_statements([marker("c"), marker("d")]);
        inner
    });

    assert_eq!(inner, vec![marker("b")]);
    assert_eq!(outer, vec![marker("a"), marker("c"), marker("d")]);
}

#[test]
fn test_prepend_goes_before_existing_statements() {
    let (file, table) = empty_file();
    let options = CompilerOptions::default();
    let visitors = VisitorMap::standard();
    let mut ctx = TransformationContext::new(&file, &table, &options, &visitors);

    let (preceding, ()) = ctx.run_in_new_frame(|ctx| {
        ctx.add_preceding_statement(marker("late"));
        ctx.prepend_preceding_statements(vec![marker("early1"), marker("early2")]);
    });
    assert_eq!(preceding, vec![marker("early1"), marker("early2"), marker("late")]);
}

#[test]
#[should_panic(expected = "no active preceding statements frame")]
fn test_preceding_statement_outside_frame_panics() {
    let (file, table) = empty_file();
    let options = CompilerOptions::default();
    let visitors = VisitorMap::standard();
    let mut ctx = TransformationContext::new(&file, &table, &options, &visitors);
    ctx.add_preceding_statement(marker("a"));
}

#[test]
fn test_temp_names_are_unique_and_readable() {
    let (file, table) = empty_file();
    let options = CompilerOptions::default();
    let visitors = VisitorMap::standard();
    let mut ctx = TransformationContext::new(&file, &table, &options, &visitors);

    let x = ctx.create_temp_for_lua_expression(&lua::Expression::identifier("x"));
    assert_eq!(x.text, "____x_0");
    assert!(x.is_temp());
    assert_eq!(ctx.create_temp_name(None), "____temp_1");
    assert_eq!(ctx.create_temp_name(Some("__foo")), "____foo_2");

    let call = lua::Expression::call(lua::Expression::identifier("g"), Vec::new());
    assert_eq!(ctx.create_temp_for_lua_expression(&call).text, "____g_result_3");

    let index = lua::Expression::table_index(lua::Expression::identifier("t"), lua::Expression::string("k"));
    assert_eq!(ctx.create_temp_for_lua_expression(&index).text, "____t_k_4");

    let anonymous = lua::Expression::table(Vec::new());
    assert_eq!(ctx.create_temp_for_lua_expression(&anonymous).text, "____temp_5");
}

#[test]
fn test_mark_function_returned_reports_try_crossing() {
    let (file, table) = empty_file();
    let options = CompilerOptions::default();
    let visitors = VisitorMap::standard();
    let mut ctx = TransformationContext::new(&file, &table, &options, &visitors);

    ctx.push_scope(ScopeKind::FILE);
    ctx.push_scope(ScopeKind::FUNCTION);
    ctx.push_scope(ScopeKind::TRY);
    assert!(ctx.mark_function_returned());
    let try_scope = ctx.pop_scope();
    assert!(try_scope.function_returned);
    assert!(ctx.peek_scope().function_returned);

    ctx.push_scope(ScopeKind::BLOCK);
    assert!(!ctx.mark_function_returned());
    ctx.pop_scope();
    ctx.pop_scope();
    // The walk stops at the function.
    assert!(!ctx.peek_scope().function_returned);
}

#[test]
fn test_find_scope_returns_innermost_match() {
    let (file, table) = empty_file();
    let options = CompilerOptions::default();
    let visitors = VisitorMap::standard();
    let mut ctx = TransformationContext::new(&file, &table, &options, &visitors);

    ctx.push_scope(ScopeKind::FILE);
    ctx.push_scope(ScopeKind::LOOP);
    ctx.push_scope(ScopeKind::LOOP);
    ctx.push_scope(ScopeKind::BLOCK);

    assert_eq!(ctx.scope_depth(), 4);
    assert_eq!(ctx.find_scope(ScopeKind::LOOP).map(|scope| scope.id), Some(3));
    assert_eq!(ctx.find_scope(ScopeKind::FILE | ScopeKind::FUNCTION).map(|scope| scope.id), Some(1));
    assert!(ctx.find_scope(ScopeKind::SWITCH).is_none());
}

#[test]
fn test_position_is_line_and_column() {
    let file = SourceFile {
        file_name: "a.ts".to_string(),
        text: "ab\ncd".to_string(),
        statements: Vec::new(),
        is_module: false,
    };
    let table = SymbolTable::new();
    let options = CompilerOptions::default();
    let visitors = VisitorMap::standard();
    let ctx = TransformationContext::new(&file, &table, &options, &visitors);

    assert_eq!(ctx.position(0), Some(SourcePosition::new(0, 0)));
    assert_eq!(ctx.position(4), Some(SourcePosition::new(1, 1)));
}

#[test]
fn test_identifier_symbol_id_remembers_first_sight() {
    let (file, mut table) = empty_file();
    let symbol = table.add_symbol("x", SymbolFlags::empty());
    let options = CompilerOptions::default();
    let visitors = VisitorMap::standard();
    let mut ctx = TransformationContext::new(&file, &table, &options, &visitors);
    ctx.push_scope(ScopeKind::FILE);

    let ident = |pos| Ident {
        id: NodeId(pos),
        pos,
        text: "x".to_string(),
        symbol: Some(symbol),
    };
    assert_eq!(ctx.known_symbol_id(symbol), None);

    let first = ctx.identifier_symbol_id(&ident(7));
    let second = ctx.identifier_symbol_id(&ident(12));
    assert_eq!(first, second);
    let id = first.unwrap();
    assert_eq!(ctx.known_symbol_id(symbol), Some(id));
    assert_eq!(ctx.symbol_info(id).map(|info| info.first_seen_at_pos), Some(7));
    assert_eq!(ctx.peek_scope().reference_count(id), 2);

    let unresolved = Ident {
        symbol: None,
        ..ident(20)
    };
    assert_eq!(ctx.identifier_symbol_id(&unresolved), None);
}

#[test]
fn test_unsupported_for_target_names_the_target() {
    let (file, table) = empty_file();
    let visitors = VisitorMap::standard();

    let options = CompilerOptions {
        lua_target: LuaTarget::LuaJit,
        ..CompilerOptions::default()
    };
    let mut ctx = TransformationContext::new(&file, &table, &options, &visitors);
    ctx.diagnose_unsupported_for_target(3, "Continue statement");
    let diagnostic = &ctx.diagnostics()[0];
    assert_eq!(diagnostic.code, diagnostic_codes::UNSUPPORTED_FOR_TARGET);
    assert_eq!(diagnostic.start, 3);
    assert_eq!(diagnostic.file, "a.ts");
    assert_eq!(
        diagnostic.message_text,
        "Continue statement is/are not supported for target LuaJIT."
    );

    let options = CompilerOptions {
        lua_target: LuaTarget::Lua51,
        ..CompilerOptions::default()
    };
    let mut ctx = TransformationContext::new(&file, &table, &options, &visitors);
    ctx.diagnose_unsupported_for_target(0, "Continue statement");
    assert_eq!(
        ctx.diagnostics()[0].message_text,
        "Continue statement is/are not supported for target Lua 5.1."
    );
}

#[test]
fn test_lualib_call_records_feature() {
    let (file, table) = empty_file();
    let options = CompilerOptions::default();
    let visitors = VisitorMap::standard();
    let mut ctx = TransformationContext::new(&file, &table, &options, &visitors);

    let call = ctx.lualib_call(LuaLibFeature::ArraySlice, vec![lua::Expression::identifier("a")], None);
    assert_eq!(
        call,
        lua::Expression::call(
            lua::Expression::identifier("__TS__ArraySlice"),
            vec![lua::Expression::identifier("a")]
        )
    );
    let (features, diagnostics) = ctx.into_output();
    assert!(features.contains(&LuaLibFeature::ArraySlice));
    assert_eq!(features.len(), 1);
    assert!(diagnostics.is_empty());
}

#[test]
fn test_ambient_statements_lower_to_nothing() {
    let b = SourceBuilder::new();
    let x = b.symbol("x", SymbolFlags::empty());
    let statement = b.ambient(b.let_(x, None));
    let (file, table) = b.finish("a.ts", vec![statement]);
    let options = CompilerOptions::default();
    let visitors = VisitorMap::standard();
    let mut ctx = TransformationContext::new(&file, &table, &options, &visitors);
    ctx.push_scope(ScopeKind::FILE);

    assert!(ctx.transform_statement(&file.statements[0]).is_empty());
    assert!(ctx.transform_statements(&file.statements).is_empty());
}
