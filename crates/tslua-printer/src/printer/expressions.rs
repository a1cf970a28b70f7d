use super::{LuaPrinter, join_with_comma};
use crate::escape::escape_string;
use crate::source_node::{Chunk, SourceNode};
use tslua_ast::names::is_valid_lua_identifier;
use tslua_ast::{
    BinaryOperator, Expression, ExpressionKind, FunctionExpression, Identifier, StatementKind, TableField,
    UnaryOperator,
};
use tslua_common::SourcePosition;
use tslua_common::limits::MAX_INLINE_LIST_LENGTH;

const UNARY_PRECEDENCE: u8 = 11;

fn binary_precedence(operator: BinaryOperator) -> u8 {
    match operator {
        BinaryOperator::Or => 1,
        BinaryOperator::And => 2,
        BinaryOperator::Equality
        | BinaryOperator::Inequality
        | BinaryOperator::LessThan
        | BinaryOperator::LessEqual
        | BinaryOperator::GreaterThan
        | BinaryOperator::GreaterEqual => 3,
        BinaryOperator::BitwiseOr => 4,
        BinaryOperator::BitwiseExclusiveOr => 5,
        BinaryOperator::BitwiseAnd => 6,
        BinaryOperator::BitwiseLeftShift | BinaryOperator::BitwiseRightShift => 7,
        BinaryOperator::Concat => 8,
        BinaryOperator::Addition | BinaryOperator::Subtraction => 9,
        BinaryOperator::Multiplication
        | BinaryOperator::Division
        | BinaryOperator::FloorDivision
        | BinaryOperator::Modulo => 10,
        BinaryOperator::Power => 12,
    }
}

fn is_right_associative(operator: BinaryOperator) -> bool {
    matches!(operator, BinaryOperator::Concat | BinaryOperator::Power)
}

/// Whether `expression` must be wrapped to keep its meaning in a context that
/// binds at least as tightly as `min_precedence`. `None` is a call or index
/// prefix, where any operator needs parentheses.
pub(crate) fn needs_parenthesis(expression: &Expression, min_precedence: Option<u8>) -> bool {
    let precedence = match &expression.kind {
        ExpressionKind::Binary { operator, .. } => binary_precedence(*operator),
        ExpressionKind::Unary { .. } => UNARY_PRECEDENCE,
        // Printed with a leading `-`, so it behaves like a negation.
        ExpressionKind::Numeric(value) if *value < 0.0 => UNARY_PRECEDENCE,
        ExpressionKind::Function(_) | ExpressionKind::Table(_) => return true,
        _ => return false,
    };
    min_precedence.is_none_or(|min| precedence < min)
}

/// Contains no calls or function literals.
pub(crate) fn is_simple_expression(expression: &Expression) -> bool {
    match &expression.kind {
        ExpressionKind::Call { .. } | ExpressionKind::MethodCall { .. } | ExpressionKind::Function(_) => false,
        ExpressionKind::Table(fields) => fields.iter().all(is_simple_field),
        ExpressionKind::TableIndex { table, index } => is_simple_expression(table) && is_simple_expression(index),
        ExpressionKind::Unary { operand, .. } => is_simple_expression(operand),
        ExpressionKind::Binary { left, right, .. } => is_simple_expression(left) && is_simple_expression(right),
        _ => true,
    }
}

fn is_simple_field(field: &TableField) -> bool {
    field.key.as_ref().is_none_or(is_simple_expression) && is_simple_expression(&field.value)
}

/// Lua numeral for `value`. Non-finite values have no numeral form.
pub(crate) fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "(0/0)".to_string();
    }
    if value.is_infinite() {
        let text = if value > 0.0 { "math.huge" } else { "-math.huge" };
        return text.to_string();
    }
    let magnitude = value.abs();
    if magnitude >= 1e21 || (magnitude != 0.0 && magnitude < 1e-6) {
        format!("{value:e}")
    } else if value.fract() == 0.0 {
        format!("{}", value as i128)
    } else {
        value.to_string()
    }
}

impl<'a> LuaPrinter<'a> {
    pub(super) fn print_expression(&mut self, expression: &Expression) -> SourceNode {
        let position = expression.position;
        match &expression.kind {
            ExpressionKind::Nil => self.source_node(position, vec!["nil".into()]),
            ExpressionKind::Dots => self.source_node(position, vec!["...".into()]),
            ExpressionKind::Arg => self.source_node(position, vec!["arg".into()]),
            ExpressionKind::Boolean(value) => {
                self.source_node(position, vec![(if *value { "true" } else { "false" }).into()])
            }
            ExpressionKind::Numeric(value) => self.source_node(position, vec![format_number(*value).into()]),
            ExpressionKind::String(value) => self.source_node(position, vec![escape_string(value).into()]),
            ExpressionKind::Function(function) => self.print_function_expression(expression, function),
            ExpressionKind::Table(fields) => {
                let mut chunks: Vec<Chunk> = vec!["{".into()];
                chunks.extend(self.print_expression_list(fields, is_simple_field, Self::print_table_field));
                chunks.push("}".into());
                self.source_node(position, chunks)
            }
            ExpressionKind::Unary { operator, operand } => {
                let mut operand_node = self.print_in_parentheses_if_needed(operand, Some(UNARY_PRECEDENCE));
                // `- -x` must not print as the comment `--x`.
                if *operator == UnaryOperator::Negation && operand_node.first_non_blank_char() == Some('-') {
                    operand_node = self.source_node(operand.position, vec!["(".into(), operand_node.into(), ")".into()]);
                }
                self.source_node(position, vec![operator.as_str().into(), operand_node.into()])
            }
            ExpressionKind::Binary { operator, left, right } => {
                let precedence = binary_precedence(*operator);
                let (left_min, right_min) = if is_right_associative(*operator) {
                    (precedence + 1, precedence)
                } else {
                    (precedence, precedence + 1)
                };
                let left = self.print_in_parentheses_if_needed(left, Some(left_min));
                let right = self.print_in_parentheses_if_needed(right, Some(right_min));
                self.source_node(
                    position,
                    vec![
                        left.into(),
                        " ".into(),
                        operator.as_str().into(),
                        " ".into(),
                        right.into(),
                    ],
                )
            }
            ExpressionKind::Call {
                expression: callee,
                params,
            } => {
                let mut chunks: Vec<Chunk> = vec![self.print_in_parentheses_if_needed(callee, None).into(), "(".into()];
                chunks.extend(self.print_expression_list(params, is_simple_expression, Self::print_expression));
                chunks.push(")".into());
                self.source_node(position, chunks)
            }
            ExpressionKind::MethodCall { prefix, name, params } => {
                let prefix_node = self.print_expression(prefix);
                let mut chunks: Vec<Chunk> = if needs_parenthesis(prefix, None) || prefix.string_value().is_some() {
                    vec!["(".into(), prefix_node.into(), ")".into()]
                } else {
                    vec![prefix_node.into()]
                };
                chunks.push(":".into());
                chunks.push(self.print_identifier(name).into());
                chunks.push("(".into());
                chunks.extend(self.print_expression_list(params, is_simple_expression, Self::print_expression));
                chunks.push(")".into());
                self.source_node(position, chunks)
            }
            ExpressionKind::Identifier(identifier) => {
                self.print_identifier_at(identifier, position.or(identifier.position))
            }
            ExpressionKind::TableIndex { table, index } => {
                let mut chunks: Vec<Chunk> = vec![self.print_in_parentheses_if_needed(table, None).into()];
                match index.string_value() {
                    Some(name) if is_valid_lua_identifier(name, self.allow_unicode()) => {
                        chunks.push(".".into());
                        chunks.push(self.source_node(index.position, vec![name.into()]).into());
                    }
                    _ => {
                        chunks.push("[".into());
                        chunks.push(self.print_expression(index).into());
                        chunks.push("]".into());
                    }
                }
                self.source_node(position, chunks)
            }
        }
    }

    fn print_in_parentheses_if_needed(&mut self, expression: &Expression, min_precedence: Option<u8>) -> SourceNode {
        let node = self.print_expression(expression);
        if needs_parenthesis(expression, min_precedence) {
            self.source_node(expression.position, vec!["(".into(), node.into(), ")".into()])
        } else {
            node
        }
    }

    pub(super) fn print_identifier(&self, identifier: &Identifier) -> SourceNode {
        self.print_identifier_at(identifier, identifier.position)
    }

    /// Identifier expressions may be positioned on the expression rather than
    /// the identifier itself.
    fn print_identifier_at(&self, identifier: &Identifier, position: Option<SourcePosition>) -> SourceNode {
        let name = identifier
            .original_name
            .as_ref()
            .filter(|original| **original != identifier.text)
            .cloned();
        SourceNode::new(position, name).with_children(vec![identifier.text.as_str().into()])
    }

    fn print_table_field(&mut self, field: &TableField) -> SourceNode {
        let value = self.print_expression(&field.value);
        let chunks: Vec<Chunk> = match &field.key {
            Some(key) => match key.string_value() {
                Some(name) if is_valid_lua_identifier(name, self.allow_unicode()) => {
                    vec![name.into(), " = ".into(), value.into()]
                }
                _ => vec![
                    "[".into(),
                    self.print_expression(key).into(),
                    "] = ".into(),
                    value.into(),
                ],
            },
            None => vec![value.into()],
        };
        self.source_node(field.position, chunks)
    }

    pub(super) fn print_function_parameters(&self, function: &FunctionExpression) -> Vec<Chunk> {
        let mut params: Vec<SourceNode> = function
            .params
            .iter()
            .map(|param| self.print_identifier(param))
            .collect();
        if function.dots {
            params.push(SourceNode::concat(vec!["...".into()]));
        }
        join_with_comma(params)
    }

    fn print_function_expression(&mut self, expression: &Expression, function: &FunctionExpression) -> SourceNode {
        let position = expression.position;
        let mut chunks: Vec<Chunk> = vec!["function(".into()];
        chunks.extend(self.print_function_parameters(function));
        chunks.push(")".into());

        if expression.is_inline_function_expression()
            && let StatementKind::Return(values) = &function.body.statements[0].kind
        {
            let mut body: Vec<Chunk> = vec!["return ".into()];
            body.extend(self.print_joined(values));
            chunks.push(" ".into());
            chunks.push(self.source_node(function.body.statements[0].position, body).into());
            chunks.push(self.source_node(position, vec![" end".into()]).into());
        } else {
            chunks.push("\n".into());
            chunks.push(self.with_indent(|printer| printer.print_block(&function.body)).into());
            let end = self.source_node(position, vec!["end".into()]);
            chunks.push(self.indent(end).into());
        }
        self.source_node(position, chunks)
    }

    /// `a, b, c` on one line.
    pub(super) fn print_joined(&mut self, expressions: &[Expression]) -> Vec<Chunk> {
        let nodes = expressions
            .iter()
            .map(|expression| self.print_expression(expression))
            .collect();
        join_with_comma(nodes)
    }

    /// Table fields or call arguments: one line when short and free of
    /// calls, otherwise one element per line at the next indentation level.
    fn print_expression_list<T>(
        &mut self,
        items: &[T],
        is_simple: fn(&T) -> bool,
        print: fn(&mut Self, &T) -> SourceNode,
    ) -> Vec<Chunk> {
        let inline = items.len() <= 1 || (items.len() <= MAX_INLINE_LIST_LENGTH && items.iter().all(is_simple));
        if inline {
            let nodes = items.iter().map(|item| print(self, item)).collect();
            return join_with_comma(nodes);
        }

        let mut chunks: Vec<Chunk> = vec!["\n".into()];
        self.with_indent(|printer| {
            for (index, item) in items.iter().enumerate() {
                let tail = if index + 1 < items.len() { ",\n" } else { "\n" };
                chunks.push(printer.indent_chunk());
                chunks.push(print(printer, item).into());
                chunks.push(tail.into());
            }
        });
        chunks.push(self.indent_chunk());
        chunks
    }
}
