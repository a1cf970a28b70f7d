use super::*;
use crate::builder::SourceBuilder;
use crate::resolver::{SymbolFlags, TypeFacts};
use crate::scope::ScopeKind;
use crate::source::BinaryOperator;
use crate::visitors::VisitorMap;
use tslua_common::{CompilerOptions, LuaTarget};

/// Compact rendering of the few node shapes these tests produce.
fn show(expression: &lua::Expression) -> String {
    match &expression.kind {
        lua::ExpressionKind::Nil => "nil".to_string(),
        lua::ExpressionKind::Numeric(value) => value.to_string(),
        lua::ExpressionKind::String(value) => format!("{value:?}"),
        lua::ExpressionKind::Identifier(identifier) => identifier.text.clone(),
        lua::ExpressionKind::Call { expression, params } => {
            let params: Vec<String> = params.iter().map(show).collect();
            format!("{}({})", show(expression), params.join(", "))
        }
        lua::ExpressionKind::TableIndex { table, index } => match index.string_value() {
            Some(name) => format!("{}.{name}", show(table)),
            None => format!("{}[{}]", show(table), show(index)),
        },
        lua::ExpressionKind::Binary { operator, left, right } => {
            format!("{} {} {}", show(left), operator.as_str(), show(right))
        }
        other => format!("{other:?}"),
    }
}

fn show_statement(statement: &lua::Statement) -> String {
    let list = |expressions: &[lua::Expression]| expressions.iter().map(show).collect::<Vec<_>>().join(", ");
    match &statement.kind {
        lua::StatementKind::VariableDeclaration { left, right } => {
            let names: Vec<&str> = left.iter().map(|identifier| identifier.text.as_str()).collect();
            if right.is_empty() {
                format!("local {}", names.join(", "))
            } else {
                format!("local {} = {}", names.join(", "), list(right))
            }
        }
        lua::StatementKind::Assignment { left, right } => format!("{} = {}", list(left), list(right)),
        lua::StatementKind::Expression(expression) => show(expression),
        lua::StatementKind::If(statement) => {
            let body: Vec<String> = statement.if_block.statements.iter().map(show_statement).collect();
            format!("if {} then {} end", show(&statement.condition), body.join("; "))
        }
        other => format!("{other:?}"),
    }
}

fn lower_list(
    b: SourceBuilder,
    expressions: Vec<Expression>,
    ordered: bool,
) -> (Vec<String>, Vec<String>, Vec<LuaLibFeature>) {
    let (file, table) = b.finish("a.ts", Vec::new());
    let options = CompilerOptions {
        lua_target: LuaTarget::Lua54,
        ..CompilerOptions::default()
    };
    let visitors = VisitorMap::standard();
    let mut ctx = TransformationContext::new(&file, &table, &options, &visitors);
    ctx.push_scope(ScopeKind::FILE);
    let (preceding, result) = ctx.run_in_new_frame(|ctx| {
        if ordered {
            let refs: Vec<&Expression> = expressions.iter().collect();
            transform_ordered_expressions(ctx, &refs)
        } else {
            transform_expression_list(ctx, &expressions)
        }
    });
    ctx.pop_scope();
    let (features, diagnostics) = ctx.into_output();
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    (
        preceding.iter().map(show_statement).collect(),
        result.iter().map(show).collect(),
        features.into_iter().collect(),
    )
}

/// `flag ?? fallback` where `flag` may be `false`, forcing preceding statements.
fn nullish(b: &SourceBuilder, fallback: &str) -> Expression {
    let flag = b.typed(b.global("flag"), TypeFacts::BOOLEAN);
    b.binary(flag, BinaryOperator::QuestionQuestion, b.global(fallback))
}

#[test]
fn test_list_without_preceding_statements_is_unchanged() {
    let b = SourceBuilder::new();
    let expressions = vec![b.global("a"), b.call(b.global("g"), Vec::new()), b.number(1.0)];
    let (preceding, result, features) = lower_list(b, expressions, false);
    assert!(preceding.is_empty());
    assert_eq!(result, ["a", "g()", "1"]);
    assert!(features.is_empty());
}

#[test]
fn test_earlier_elements_are_snapshotted() {
    let b = SourceBuilder::new();
    let expressions = vec![b.global("a"), nullish(&b, "c")];
    let (preceding, result, _) = lower_list(b, expressions, false);
    assert_eq!(
        preceding,
        [
            "local ____a_1 = a",
            "local ____flag_0 = flag",
            "if ____flag_0 == nil then ____flag_0 = c end",
        ]
    );
    assert_eq!(result, ["____a_1", "____flag_0"]);
}

#[test]
fn test_literals_and_constants_keep_their_place() {
    let b = SourceBuilder::new();
    let k = b.symbol("k", SymbolFlags::CONST);
    let expressions = vec![b.number(1.0), b.id(k), b.string("s"), nullish(&b, "c")];
    let (preceding, result, _) = lower_list(b, expressions, false);
    assert_eq!(preceding.len(), 2);
    assert_eq!(result, ["1", "k", "\"s\"", "____flag_0"]);
}

#[test]
fn test_too_many_snapshots_build_sparse_array() {
    let b = SourceBuilder::new();
    let expressions = vec![b.global("a"), b.global("b"), b.global("c"), nullish(&b, "d")];
    let (preceding, result, features) = lower_list(b, expressions, false);
    assert_eq!(
        preceding,
        [
            "local ____array_1 = __TS__SparseArrayNew(a, b, c)",
            "local ____flag_0 = flag",
            "if ____flag_0 == nil then ____flag_0 = d end",
            "__TS__SparseArrayPush(____array_1, ____flag_0)",
        ]
    );
    assert_eq!(result, ["__TS__SparseArraySpread(____array_1)"]);
    assert!(features.contains(&LuaLibFeature::SparseArrayNew));
    assert!(features.contains(&LuaLibFeature::SparseArrayPush));
    assert!(features.contains(&LuaLibFeature::SparseArraySpread));
}

#[test]
fn test_spread_before_last_builds_sparse_array() {
    let b = SourceBuilder::new();
    let expressions = vec![b.spread(b.global("xs")), b.global("a")];
    let (preceding, result, features) = lower_list(b, expressions, false);
    assert_eq!(
        preceding,
        [
            "local ____array_0 = __TS__SparseArrayNew(table.unpack(xs))",
            "__TS__SparseArrayPush(____array_0, a)",
        ]
    );
    assert_eq!(result, ["__TS__SparseArraySpread(____array_0)"]);
    assert!(features.contains(&LuaLibFeature::SparseArraySpread));
}

#[test]
fn test_trailing_spread_stays_inline() {
    let b = SourceBuilder::new();
    let expressions = vec![b.global("a"), b.spread(b.global("xs"))];
    let (preceding, result, features) = lower_list(b, expressions, false);
    assert!(preceding.is_empty());
    assert_eq!(result, ["a", "table.unpack(xs)"]);
    assert!(features.is_empty());
}

#[test]
fn test_ordered_expressions_always_snapshot() {
    let b = SourceBuilder::new();
    let expressions = vec![b.global("a"), b.global("b"), b.global("c"), nullish(&b, "d")];
    let (preceding, result, _) = lower_list(b, expressions, true);
    assert_eq!(
        preceding,
        [
            "local ____a_1 = a",
            "local ____b_2 = b",
            "local ____c_3 = c",
            "local ____flag_0 = flag",
            "if ____flag_0 == nil then ____flag_0 = d end",
        ]
    );
    assert_eq!(result, ["____a_1", "____b_2", "____c_3", "____flag_0"]);
}

#[test]
fn test_empty_list() {
    let (preceding, result, features) = lower_list(SourceBuilder::new(), Vec::new(), false);
    assert!(preceding.is_empty());
    assert!(result.is_empty());
    assert!(features.is_empty());
}

#[test]
fn test_should_move_to_temp() {
    let b = SourceBuilder::new();
    let k = b.symbol("k", SymbolFlags::CONST);
    let v = b.symbol("v", SymbolFlags::empty());
    let constant = b.id(k);
    let variable = b.id(v);
    let this = b.this();
    let continuation = b.continuation();
    let (file, table) = b.finish("a.ts", Vec::new());
    let options = CompilerOptions::default();
    let visitors = VisitorMap::standard();
    let mut ctx = TransformationContext::new(&file, &table, &options, &visitors);

    let name = |text: &str| lua::Expression::identifier(text);
    assert!(!should_move_to_temp(&ctx, &lua::Expression::number(1.0), None));
    assert!(!should_move_to_temp(&ctx, &lua::Expression::from(lua::Identifier::temp("____t")), None));
    assert!(!should_move_to_temp(&ctx, &name("self"), Some(&this)));
    assert!(!should_move_to_temp(&ctx, &name("k"), Some(&constant)));
    assert!(!should_move_to_temp(&ctx, &name("opt"), Some(&continuation)));
    assert!(should_move_to_temp(&ctx, &name("v"), Some(&variable)));
    assert!(should_move_to_temp(&ctx, &name("g"), None));

    let (preceding, literal) =
        ctx.run_in_new_frame(|ctx| move_to_preceding_temp(ctx, lua::Expression::string("s"), None));
    assert!(preceding.is_empty());
    assert_eq!(literal, lua::Expression::string("s"));
}
