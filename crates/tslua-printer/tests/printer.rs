use super::expressions::{format_number, needs_parenthesis};
use super::*;
use tslua_ast::{
    BinaryOperator, Block, Comment, ElseBranch, IfStatement, NodeFlags, TableField, UnaryOperator,
};
use tslua_common::LuaTarget;
use tslua_common::lualib::LuaLibProvider;

fn headerless() -> CompilerOptions {
    CompilerOptions {
        no_header: true,
        ..Default::default()
    }
}

fn print_file_with(options: &CompilerOptions, file: &lua::File) -> String {
    LuaPrinter::new(options, "out/main.lua", "src/main.ts")
        .print(file)
        .code
}

fn print_statements(statements: Vec<Statement>) -> String {
    print_file_with(&headerless(), &lua::File::new(statements))
}

fn print_expression(expression: Expression) -> String {
    let code = print_statements(vec![Statement::expression(Expression::call(
        Expression::identifier("f"),
        vec![expression],
    ))]);
    code.strip_prefix("f(")
        .and_then(|rest| rest.strip_suffix(")\n"))
        .expect("single argument call")
        .to_string()
}

fn id(name: &str) -> Expression {
    Expression::identifier(name)
}

fn num(value: f64) -> Expression {
    Expression::number(value)
}

fn bin(left: Expression, operator: BinaryOperator, right: Expression) -> Expression {
    Expression::binary(left, operator, right)
}

fn call(name: &str, params: Vec<Expression>) -> Expression {
    Expression::call(id(name), params)
}

fn empty_function() -> Expression {
    Expression::function(Vec::new(), false, Block::default())
}

// =============================================================================
// File layout
// =============================================================================

#[test]
fn test_header_and_trivia() {
    let mut file = lua::File::new(vec![Statement::expression(call("f", vec![]))]);
    assert_eq!(
        print_file_with(&CompilerOptions::default(), &file),
        format!("{TSLUA_HEADER}f()\n")
    );

    file.trivia = "#!/usr/bin/env lua\n".to_string();
    assert_eq!(
        print_file_with(&CompilerOptions::default(), &file),
        format!("#!/usr/bin/env lua\n{TSLUA_HEADER}f()\n")
    );
    assert_eq!(print_file_with(&headerless(), &file), "#!/usr/bin/env lua\nf()\n");
}

#[test]
fn test_empty_file_prints_nothing_without_header() {
    assert_eq!(print_statements(Vec::new()), "");
}

#[test]
fn test_statements_after_return_are_dropped() {
    let code = print_statements(vec![
        Statement::local(vec![Identifier::new("x")], vec![num(1.0)]),
        Statement::assign(vec![id("x")], vec![bin(id("x"), BinaryOperator::Addition, num(1.0))]),
        Statement::ret(vec![id("x")]),
        Statement::expression(call("unreachable", vec![])),
    ]);
    assert_eq!(code, "local x = 1\nx = x + 1\nreturn x\n");
}

#[test]
fn test_semicolon_separates_ambiguous_call() {
    let iife = Statement::expression(Expression::call(empty_function(), vec![]));
    let code = print_statements(vec![
        Statement::local(vec![Identifier::new("a")], vec![num(1.0)]),
        iife.clone(),
    ]);
    assert_eq!(code, "local a = 1;\n(function()\nend)()\n");

    // Block statements end in `end`, which cannot continue into a call.
    let code = print_statements(vec![Statement::do_block(vec![]), iife]);
    assert_eq!(code, "do\nend\n(function()\nend)()\n");
}

#[test]
fn test_semicolon_goes_before_trailing_comment() {
    let mut declaration = Statement::local(vec![Identifier::new("a")], vec![num(1.0)]);
    declaration.trailing_comments = vec![Comment::Line(" note".to_string())];
    let code = print_statements(vec![
        declaration,
        Statement::expression(Expression::call(empty_function(), vec![])),
    ]);
    assert_eq!(code, "local a = 1;\n-- note\n(function()\nend)()\n");
}

#[test]
fn test_comments() {
    let mut documented = Statement::expression(call("f", vec![]));
    documented.leading_comments = vec![Comment::Line("- hi".to_string()), Comment::Block(Vec::new())];
    assert_eq!(print_statements(vec![documented]), "--- hi\n--[[]]\nf()\n");

    let mut nested = Statement::break_loop();
    nested.leading_comments = vec![Comment::Block(vec!["first".to_string(), "second".to_string()])];
    assert_eq!(
        print_statements(vec![Statement::do_block(vec![nested])]),
        "do\n    --[[first\n    second]]\n    break\nend\n"
    );
}

// =============================================================================
// Control flow
// =============================================================================

#[test]
fn test_if_elseif_else_chain() {
    let statement = Statement::if_then(
        id("a"),
        Block::new(vec![Statement::ret(vec![num(1.0)])]),
        Some(ElseBranch::If(Box::new(IfStatement {
            condition: id("b"),
            if_block: Block::new(vec![Statement::ret(vec![num(2.0)])]),
            else_block: Some(ElseBranch::Block(Block::new(vec![Statement::ret(vec![num(3.0)])]))),
        }))),
    );
    assert_eq!(
        print_statements(vec![statement]),
        "if a then\n    return 1\nelseif b then\n    return 2\nelse\n    return 3\nend\n"
    );
}

#[test]
fn test_loops() {
    let while_loop = Statement::while_loop(id("c"), Block::new(vec![Statement::expression(call("f", vec![]))]));
    assert_eq!(print_statements(vec![while_loop]), "while c do\n    f()\nend\n");

    let repeat = Statement::repeat_until(
        Block::new(vec![Statement::break_loop()]),
        Expression::unary(UnaryOperator::Not, id("done")),
    );
    assert_eq!(print_statements(vec![repeat]), "repeat\n    break\nuntil not done\n");

    let numeric = Statement::numeric_for(
        Identifier::new("i"),
        num(1.0),
        num(10.0),
        Some(num(2.0)),
        Block::new(vec![Statement::expression(call("print", vec![id("i")]))]),
    );
    assert_eq!(print_statements(vec![numeric]), "for i = 1, 10, 2 do\n    print(i)\nend\n");

    let generic = Statement::for_in(
        vec![Identifier::new("____"), Identifier::new("v")],
        vec![call("ipairs", vec![id("arr")])],
        Block::new(vec![
            Statement::goto("__continue1"),
            Statement::label("__continue1"),
        ]),
    );
    assert_eq!(
        print_statements(vec![generic]),
        "for ____, v in ipairs(arr) do\n    goto __continue1\n    ::__continue1::\nend\n"
    );
}

#[test]
fn test_bare_return() {
    assert_eq!(print_statements(vec![Statement::ret(vec![])]), "return\n");
}

// =============================================================================
// Functions
// =============================================================================

#[test]
fn test_local_function_definition() {
    let function = Expression::function(
        vec![Identifier::new("a"), Identifier::new("b")],
        true,
        Block::new(vec![Statement::ret(vec![id("a")])]),
    );
    let statement = Statement::local(vec![Identifier::new("f")], vec![function]);
    assert_eq!(print_statements(vec![statement]), "local function f(a, b, ...)\n    return a\nend\n");
}

#[test]
fn test_declaration_assignment_uses_function_syntax_for_dotted_names() {
    let declaration = empty_function().set_flags(NodeFlags::DECLARATION);
    let dotted = Statement::assign(vec![Expression::property(id("M"), "run")], vec![declaration.clone()]);
    assert_eq!(print_statements(vec![dotted]), "function M.run()\nend\n");

    let keyword_key = Statement::assign(vec![Expression::property(id("M"), "end")], vec![declaration]);
    assert_eq!(print_statements(vec![keyword_key]), "M[\"end\"] = function()\nend\n");

    let plain = Statement::assign(vec![Expression::property(id("M"), "run")], vec![empty_function()]);
    assert_eq!(print_statements(vec![plain]), "M.run = function()\nend\n");
}

#[test]
fn test_inline_function_expression() {
    let inline = Expression::function(
        vec![Identifier::new("x")],
        false,
        Block::new(vec![Statement::ret(vec![bin(id("x"), BinaryOperator::Multiplication, num(2.0))])]),
    )
    .set_flags(NodeFlags::INLINE);
    assert_eq!(print_expression(inline), "function(x) return x * 2 end");
}

#[test]
fn test_nested_function_body_is_indented() {
    let function = Expression::function(Vec::new(), false, Block::new(vec![Statement::ret(vec![num(1.0)])]));
    let table = Expression::table(vec![TableField::keyed(Expression::string("run"), function)]);
    let statement = Statement::local(vec![Identifier::new("t")], vec![table]);
    assert_eq!(print_statements(vec![statement]), "local t = {run = function()\n    return 1\nend}\n");

    let inner = Statement::local(vec![Identifier::new("g")], vec![empty_function()]);
    let outer = Statement::local(
        vec![Identifier::new("f")],
        vec![Expression::function(Vec::new(), false, Block::new(vec![inner]))],
    );
    assert_eq!(
        print_statements(vec![outer]),
        "local function f()\n    local function g()\n    end\nend\n"
    );
}

// =============================================================================
// Expressions
// =============================================================================

#[test]
fn test_binary_precedence_and_associativity() {
    use BinaryOperator::*;
    assert_eq!(print_expression(bin(bin(id("a"), Addition, id("b")), Multiplication, id("c"))), "(a + b) * c");
    assert_eq!(print_expression(bin(id("a"), Addition, bin(id("b"), Multiplication, id("c")))), "a + b * c");
    assert_eq!(print_expression(bin(id("a"), Subtraction, bin(id("b"), Subtraction, id("c")))), "a - (b - c)");
    assert_eq!(print_expression(bin(bin(id("a"), Subtraction, id("b")), Subtraction, id("c"))), "a - b - c");
    assert_eq!(print_expression(bin(id("a"), Power, bin(id("b"), Power, id("c")))), "a ^ b ^ c");
    assert_eq!(print_expression(bin(bin(id("a"), Power, id("b")), Power, id("c"))), "(a ^ b) ^ c");
    assert_eq!(print_expression(bin(id("a"), Concat, bin(id("b"), Concat, id("c")))), "a .. b .. c");
    assert_eq!(print_expression(bin(bin(id("a"), Concat, id("b")), Concat, id("c"))), "(a .. b) .. c");
    assert_eq!(
        print_expression(bin(bin(id("a"), Or, id("b")), And, bin(id("c"), Equality, id("d")))),
        "(a or b) and c == d"
    );
}

#[test]
fn test_unary_parenthesization() {
    assert_eq!(
        print_expression(Expression::unary(UnaryOperator::Not, bin(id("a"), BinaryOperator::Equality, id("b")))),
        "not (a == b)"
    );
    assert_eq!(
        print_expression(bin(
            Expression::unary(UnaryOperator::Negation, id("x")),
            BinaryOperator::Power,
            num(2.0)
        )),
        "(-x) ^ 2"
    );
    assert_eq!(
        print_expression(bin(Expression::unary(UnaryOperator::Length, id("t")), BinaryOperator::Addition, num(1.0))),
        "#t + 1"
    );
    assert_eq!(print_expression(bin(num(-2.0), BinaryOperator::Power, num(2.0))), "(-2) ^ 2");
    assert_eq!(print_expression(bin(id("a"), BinaryOperator::Subtraction, num(-5.0))), "a - -5");
}

#[test]
fn test_double_negation_never_prints_a_comment() {
    let negate = |operand| Expression::unary(UnaryOperator::Negation, operand);
    assert_eq!(print_expression(negate(negate(id("x")))), "-(-x)");
    assert_eq!(print_expression(negate(num(-1.0))), "-(-1)");
    assert_eq!(
        print_expression(Expression::unary(UnaryOperator::BitwiseNot, Expression::unary(UnaryOperator::BitwiseNot, id("x")))),
        "~~x"
    );
}

#[test]
fn test_prefix_expressions_are_parenthesized() {
    assert_eq!(print_expression(Expression::call(empty_function(), vec![])), "(function()\nend)()");
    assert_eq!(print_expression(Expression::property(Expression::table(vec![]), "x")), "({}).x");
    assert_eq!(print_expression(Expression::method_call(Expression::string("abc"), "upper", vec![])), "(\"abc\"):upper()");
    assert_eq!(
        print_expression(Expression::method_call(bin(id("a"), BinaryOperator::Concat, id("b")), "len", vec![])),
        "(a .. b):len()"
    );
    assert_eq!(print_expression(Expression::method_call(id("obj"), "m", vec![num(1.0)])), "obj:m(1)");
    assert_eq!(print_expression(Expression::call(Expression::property(id("a"), "b"), vec![])), "a.b()");
}

#[test]
fn test_table_index_forms() {
    assert_eq!(print_expression(Expression::property(id("t"), "name")), "t.name");
    assert_eq!(print_expression(Expression::property(id("t"), "end")), "t[\"end\"]");
    assert_eq!(print_expression(Expression::property(id("t"), "a-b")), "t[\"a-b\"]");
    assert_eq!(print_expression(Expression::table_index(id("t"), num(1.0))), "t[1]");
    assert_eq!(print_expression(Expression::table_index(id("t"), id("k"))), "t[k]");
}

#[test]
fn test_table_fields() {
    let table = Expression::table(vec![
        TableField::positional(num(1.0)),
        TableField::keyed(Expression::string("name"), Expression::string("x")),
        TableField::keyed(Expression::string("end"), Expression::boolean(true)),
        TableField::keyed(num(2.0), Expression::nil()),
    ]);
    assert_eq!(print_expression(table), "{1, name = \"x\", [\"end\"] = true, [2] = nil}");
    assert_eq!(print_expression(Expression::table_of(vec![call("g", vec![])])), "{g()}");
}

#[test]
fn test_expression_list_wrapping() {
    let args = |count: usize| (1..=count).map(|n| num(n as f64)).collect::<Vec<_>>();
    let four = print_statements(vec![Statement::expression(call("f", args(4)))]);
    assert_eq!(four, "f(1, 2, 3, 4)\n");

    let five = print_statements(vec![Statement::expression(call("f", args(5)))]);
    assert_eq!(five, "f(\n    1,\n    2,\n    3,\n    4,\n    5\n)\n");

    let with_call = print_statements(vec![Statement::expression(call("f", vec![call("g", vec![]), num(1.0)]))]);
    assert_eq!(with_call, "f(\n    g(),\n    1\n)\n");

    let nested = Statement::do_block(vec![Statement::expression(call("f", vec![call("g", vec![]), id("x")]))]);
    assert_eq!(print_statements(vec![nested]), "do\n    f(\n        g(),\n        x\n    )\nend\n");
}

#[test]
fn test_literals() {
    assert_eq!(print_expression(Expression::nil()), "nil");
    assert_eq!(print_expression(Expression::dots()), "...");
    assert_eq!(print_expression(Expression::new(tslua_ast::ExpressionKind::Arg)), "arg");
    assert_eq!(print_expression(Expression::boolean(false)), "false");
    assert_eq!(print_expression(Expression::string("a\"b\n")), "\"a\\\"b\\n\"");
}

#[test]
fn test_format_number() {
    assert_eq!(format_number(1.0), "1");
    assert_eq!(format_number(1.5), "1.5");
    assert_eq!(format_number(0.25), "0.25");
    assert_eq!(format_number(-0.0), "0");
    assert_eq!(format_number(-3.0), "-3");
    assert_eq!(format_number(123456789.0), "123456789");
    assert_eq!(format_number(1e21), "1e21");
    assert_eq!(format_number(1e-7), "1e-7");
    assert_eq!(format_number(f64::INFINITY), "math.huge");
    assert_eq!(format_number(f64::NEG_INFINITY), "-math.huge");
    assert_eq!(format_number(f64::NAN), "(0/0)");
}

#[test]
fn test_needs_parenthesis() {
    let sum = bin(id("a"), BinaryOperator::Addition, id("b"));
    assert!(needs_parenthesis(&sum, None));
    assert!(needs_parenthesis(&sum, Some(10)));
    assert!(!needs_parenthesis(&sum, Some(9)));
    assert!(needs_parenthesis(&empty_function(), Some(1)));
    assert!(needs_parenthesis(&Expression::table(vec![]), None));
    assert!(!needs_parenthesis(&id("a"), None));
    assert!(!needs_parenthesis(&num(2.0), None));
    assert!(needs_parenthesis(&num(-2.0), None));
}

#[test]
fn test_identifier_original_name_becomes_source_map_name() {
    let options = headerless();
    let printer = LuaPrinter::new(&options, "main.lua", "main.ts");
    let renamed = printer.print_identifier(&Identifier::new("____end").with_original_name("end"));
    assert_eq!(renamed.name.as_deref(), Some("end"));
    let same = printer.print_identifier(&Identifier::new("x").with_original_name("x"));
    assert_eq!(same.name, None);
    assert_eq!(printer.print_identifier(&Identifier::new("y")).name, None);
}

// =============================================================================
// Lualib imports and traceback
// =============================================================================

struct UnpackOnly;

impl LuaLibProvider for UnpackOnly {
    fn feature_source(&self, feature: LuaLibFeature, _target: LuaTarget) -> Option<String> {
        (feature == LuaLibFeature::Unpack).then(|| format!("local function {}() end", feature.export_name()))
    }
}

fn file_using(features: &[LuaLibFeature]) -> lua::File {
    let mut file = lua::File::new(vec![Statement::assign(vec![id("x")], vec![num(1.0)])]);
    file.lualib_features.extend(features.iter().copied());
    file
}

#[test]
fn test_lualib_require_imports() {
    let file = file_using(&[LuaLibFeature::Unpack, LuaLibFeature::SparseArrayNew]);
    let expected = "local ____lualib = require(\"lualib_bundle\")\n\
                    local __TS__SparseArrayNew = ____lualib.__TS__SparseArrayNew\n\
                    local __TS__Unpack = ____lualib.__TS__Unpack\n\
                    x = 1\n";
    assert_eq!(print_file_with(&headerless(), &file), expected);

    let minimal = CompilerOptions {
        lua_lib_import: LuaLibImportKind::RequireMinimal,
        ..headerless()
    };
    assert_eq!(print_file_with(&minimal, &file), expected);

    let with_header = print_file_with(&CompilerOptions::default(), &file);
    assert!(with_header.starts_with(&format!("{TSLUA_HEADER}local ____lualib")));
}

#[test]
fn test_lualib_inline_and_none_imports() {
    let file = file_using(&[LuaLibFeature::Unpack]);

    let none = CompilerOptions {
        lua_lib_import: LuaLibImportKind::None,
        ..headerless()
    };
    assert_eq!(print_file_with(&none, &file), "x = 1\n");

    let inline = CompilerOptions {
        lua_lib_import: LuaLibImportKind::Inline,
        ..headerless()
    };
    let bundle = Arc::new(LuaLibBundle::build(LuaTarget::Lua54, &UnpackOnly));
    let code = LuaPrinter::new(&inline, "main.lua", "main.ts")
        .with_lualib_bundle(bundle)
        .print(&file)
        .code;
    assert_eq!(
        code,
        "-- Lua Library inline imports\nlocal function __TS__Unpack() end\n-- End of Lua Library inline imports\nx = 1\n"
    );
}

#[test]
fn test_no_imports_without_features() {
    assert_eq!(print_file_with(&headerless(), &file_using(&[])), "x = 1\n");
}

#[test]
fn test_traceback_placeholder_is_replaced() {
    let options = CompilerOptions {
        source_map_traceback: true,
        lua_lib_import: LuaLibImportKind::None,
        ..headerless()
    };
    let file = lua::File::new(vec![
        Statement::local(vec![Identifier::new("x")], vec![num(1.0)])
            .with_position(Some(SourcePosition::new(0, 0))),
        Statement::local(vec![Identifier::new("y")], vec![num(2.0)])
            .with_position(Some(SourcePosition::new(2, 0))),
    ]);
    let code = print_file_with(&options, &file);
    assert_eq!(
        code,
        "__TS__SourceMapTraceBack(debug.getinfo(1).short_src, {[\"2\"] = 1,[\"3\"] = 3});\nlocal x = 1\nlocal y = 2\n"
    );
    assert!(!code.contains(SOURCE_MAP_TRACEBACK_PLACEHOLDER));
}

#[test]
fn test_traceback_imports_its_lualib_feature() {
    let options = CompilerOptions {
        source_map_traceback: true,
        ..headerless()
    };
    let code = print_file_with(&options, &lua::File::new(Vec::new()));
    assert!(code.starts_with(
        "local ____lualib = require(\"lualib_bundle\")\n\
         local __TS__SourceMapTraceBack = ____lualib.__TS__SourceMapTraceBack\n\
         __TS__SourceMapTraceBack(debug.getinfo(1).short_src, {});\n"
    ));
}

#[test]
fn test_printing_is_deterministic() {
    let file = file_using(&[LuaLibFeature::Unpack]);
    let options = CompilerOptions::default();
    let first = LuaPrinter::new(&options, "main.lua", "main.ts").print(&file);
    let second = LuaPrinter::new(&options, "main.lua", "main.ts").print(&file);
    assert_eq!(first.code, second.code);
    assert_eq!(first.source_map, second.source_map);
    assert_eq!(first.source_map_node.to_string(), first.code);
}

#[test]
fn test_printer_reuse_repeats_text_and_map() {
    let positioned = |line: u32| Some(SourcePosition::new(line, 2));
    let body = Block::new(vec![
        Statement::ret(vec![call("g", vec![id("x").with_position(positioned(1))])]).with_position(positioned(1)),
    ]);
    let file = lua::File::new(vec![
        Statement::local(
            vec![Identifier::new("h").with_position(positioned(0))],
            vec![Expression::function(vec![Identifier::new("x")], false, body).with_position(positioned(0))],
        )
        .with_position(positioned(0)),
        Statement::expression(call("h", vec![num(1.0)]).with_position(positioned(3))).with_position(positioned(3)),
    ]);
    let options = CompilerOptions {
        source_map_traceback: true,
        ..Default::default()
    };
    let mut printer = LuaPrinter::new(&options, "out/main.lua", "src/main.ts");
    let first = printer.print(&file);
    let second = printer.print(&file);
    assert_eq!(first.code, second.code);
    assert_eq!(first.source_map, second.source_map);
    assert_eq!(first.code.matches("__TS__SourceMapTraceBack(").count(), 1);

    let fresh = LuaPrinter::new(&options, "out/main.lua", "src/main.ts").print(&file);
    assert_eq!(fresh.code, first.code);
    assert_eq!(fresh.source_map, first.source_map);
}
