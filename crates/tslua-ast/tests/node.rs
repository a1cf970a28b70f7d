use super::*;

#[test]
fn test_temp_identifiers_carry_temp_symbol() {
    let temp = Identifier::temp("____tmp_0");
    assert!(temp.is_temp());
    assert!(!Identifier::new("x").is_temp());
    assert!(!Identifier::new("x").with_symbol(Some(SymbolId(3))).is_temp());
}

#[test]
fn test_literal_classification() {
    assert!(Expression::nil().is_literal());
    assert!(Expression::dots().is_literal());
    assert!(Expression::string("a").is_literal());
    assert!(!Expression::identifier("a").is_literal());
    assert!(!Expression::table(vec![]).is_literal());
}

#[test]
fn test_assignment_targets() {
    assert!(Expression::identifier("a").is_assignment_left_hand_side());
    assert!(Expression::property(Expression::identifier("t"), "k").is_assignment_left_hand_side());
    assert!(!Expression::call(Expression::identifier("f"), vec![]).is_assignment_left_hand_side());
}

#[test]
fn test_function_definition_requires_single_function_value() {
    let function = Expression::function(vec![], false, Block::default());
    assert!(Statement::local(vec![Identifier::new("f")], vec![function.clone()]).is_function_definition());
    assert!(
        Statement::assign(vec![Expression::identifier("f")], vec![function.clone()])
            .is_function_definition()
    );
    assert!(
        !Statement::local(
            vec![Identifier::new("f"), Identifier::new("g")],
            vec![function.clone(), function]
        )
        .is_function_definition()
    );
    assert!(!Statement::local(vec![Identifier::new("f")], vec![]).is_function_definition());
}

#[test]
fn test_inline_function_needs_flag_and_single_return() {
    let body = Block::new(vec![Statement::ret(vec![Expression::number(1.0)])]);
    let plain = Expression::function(vec![], false, body.clone());
    assert!(!plain.is_inline_function_expression());
    assert!(plain.clone().set_flags(NodeFlags::INLINE).is_inline_function_expression());

    let two_statements = Block::new(vec![Statement::break_loop(), Statement::ret(vec![])]);
    let not_inline = Expression::function(vec![], false, two_statements).set_flags(NodeFlags::INLINE);
    assert!(!not_inline.is_inline_function_expression());
}

#[test]
fn test_clone_node_drops_registration() {
    let stmt = Statement::local(vec![Identifier::new("x")], vec![]).with_id(StatementId(7));
    let copy = stmt.clone_node();
    assert_eq!(copy.id, None);
    assert_eq!(copy.kind, stmt.kind);
}

#[test]
fn test_number_value_looks_through_negation() {
    let negative = Expression::unary(UnaryOperator::Negation, Expression::number(2.0));
    assert_eq!(negative.number_value(), Some(-2.0));
    assert_eq!(Expression::string("2").number_value(), None);
}

#[test]
fn test_unpack_call_flag() {
    let call = Expression::call(Expression::identifier("unpack"), vec![Expression::identifier("t")]);
    assert!(!call.is_unpack_call());
    assert!(call.set_flags(NodeFlags::TABLE_UNPACK_CALL).is_unpack_call());
}
