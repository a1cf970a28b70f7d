use super::*;
use crate::resolver::Resolver;

#[test]
fn test_positions_follow_source_order() {
    let b = SourceBuilder::new();
    let x = b.symbol("x", SymbolFlags::empty());
    let y = b.symbol("y", SymbolFlags::empty());
    let statements = vec![b.let_(x, Some(b.number(1.0))), b.let_(y, None)];
    let (file, table) = b.finish("a.ts", statements);

    assert_eq!(file.text, "xxxxx\nxxxx");
    assert_eq!(file.statements[0].pos, 0);
    assert_eq!(file.statements[1].pos, 6);

    let StatementKind::Variable { list, .. } = &file.statements[0].kind else {
        panic!("expected a variable statement");
    };
    assert_eq!(list.pos, 1);
    let declaration = &list.declarations[0];
    assert_eq!(declaration.pos, 2);
    let BindingName::Identifier(name) = &declaration.name else {
        panic!("expected an identifier binding");
    };
    assert_eq!(name.pos, 3);
    assert_eq!(declaration.initializer.as_ref().map(|init| init.pos), Some(4));

    assert_eq!(table.declaration_position(x), Some(3));
    assert_eq!(table.declaration_position(y), Some(9));
}

#[test]
fn test_function_is_declared_at_statement() {
    let b = SourceBuilder::new();
    let f = b.symbol("f", SymbolFlags::empty());
    let x = b.symbol("x", SymbolFlags::empty());
    let statements = vec![
        b.expression_statement(b.call(b.id(f), Vec::new())),
        b.function_declaration(f, vec![b.param(x)], vec![b.ret(Some(b.id(x)))]),
    ];
    let (file, table) = b.finish("a.ts", statements);

    // call: statement, call, callee
    let function_pos = file.statements[1].pos;
    assert_eq!(function_pos, 4);
    assert_eq!(table.declaration_position(f), Some(function_pos));
    // name, parameter, binding
    assert_eq!(table.declaration_position(x), Some(function_pos + 3));
}

#[test]
fn test_first_declaration_wins() {
    let b = SourceBuilder::new();
    let x = b.symbol("x", SymbolFlags::empty());
    let statements = vec![b.var_(x, None), b.var_(x, None)];
    let (_, table) = b.finish("a.ts", statements);
    assert_eq!(table.declaration_position(x), Some(3));
}

#[test]
fn test_modules_are_detected_by_imports_and_exports() {
    let b = SourceBuilder::new();
    let x = b.symbol("x", SymbolFlags::empty());
    let statements = vec![b.let_(x, None)];
    let (script, _) = b.finish("a.ts", statements);
    assert!(!script.is_module);

    let b = SourceBuilder::new();
    let x = b.symbol("x", SymbolFlags::EXPORTED);
    let statements = vec![b.exported(b.let_(x, None))];
    let (exporting, _) = b.finish("a.ts", statements);
    assert!(exporting.is_module);

    let b = SourceBuilder::new();
    let statements = vec![b.import("./side", None)];
    let (importing, _) = b.finish("a.ts", statements);
    assert!(importing.is_module);
}

#[test]
fn test_type_facts_and_context_are_recorded() {
    let b = SourceBuilder::new();
    let value = b.typed(b.global("value"), TypeFacts::NUMBER);
    let value_node = value.id;
    let callback = b.with_context(b.arrow(Vec::new(), b.number(1.0)), ContextType::NonVoid);
    let ExpressionKind::Function(function) = &callback.kind else {
        panic!("expected a function");
    };
    let function_node = function.id;
    let untyped = b.global("other");
    let untyped_node = untyped.id;

    let statements = vec![
        b.expression_statement(value),
        b.expression_statement(callback),
        b.expression_statement(untyped),
    ];
    let (_, table) = b.finish("a.ts", statements);
    assert_eq!(table.type_facts(value_node), TypeFacts::NUMBER);
    assert_eq!(table.type_facts(untyped_node), TypeFacts::empty());
    assert_eq!(table.context_type(function_node), ContextType::NonVoid);
    assert_eq!(table.context_type(untyped_node), ContextType::Void);
}

#[test]
fn test_symbol_flags_answer_resolver_questions() {
    let b = SourceBuilder::new();
    let c = b.symbol("c", SymbolFlags::CONST);
    let e = b.symbol("e", SymbolFlags::EXPORTED);
    let unused = b.symbol("unused", SymbolFlags::UNUSED_ALIAS);
    let (_, table) = b.finish("a.ts", Vec::new());

    assert!(table.is_const(c));
    assert!(!table.is_const(e));
    assert!(table.is_exported(e));
    assert!(table.is_referenced_alias(c));
    assert!(!table.is_referenced_alias(unused));
    assert_eq!(table.declaration_position(c), None);
}

#[test]
fn test_shebang_is_first_line_only() {
    let mut file = SourceFile {
        file_name: "a.ts".to_string(),
        text: "#!/usr/bin/env lua\nlet x".to_string(),
        statements: Vec::new(),
        is_module: false,
    };
    assert_eq!(file.shebang(), "#!/usr/bin/env lua\n");

    file.text = "let x".to_string();
    assert_eq!(file.shebang(), "");
}
