use super::{LuaPrinter, join_with_comma};
use crate::source_node::{Chunk, SourceNode};
use tslua_ast::names::is_valid_function_declaration_name;
use tslua_ast::{Block, Comment, ElseBranch, FunctionExpression, IfStatement, NodeFlags, Statement, StatementKind};
use tslua_common::SourcePosition;

/// A statement printed apart from its comments so a separating `;` can be
/// attached to the code rather than to a trailing comment.
struct PrintedStatement {
    leading: Option<String>,
    body: SourceNode,
    trailing: Option<String>,
}

impl PrintedStatement {
    fn into_node(self) -> SourceNode {
        if self.leading.is_none() && self.trailing.is_none() {
            return self.body;
        }
        let mut chunks: Vec<Chunk> = Vec::with_capacity(5);
        if let Some(leading) = self.leading {
            chunks.push(leading.into());
            chunks.push("\n".into());
        }
        chunks.push(self.body.into());
        if let Some(trailing) = self.trailing {
            chunks.push("\n".into());
            chunks.push(trailing.into());
        }
        SourceNode::concat(chunks)
    }
}

/// Statements after which a line starting with `(` would parse as a call.
fn may_require_semicolon(statement: &Statement) -> bool {
    matches!(
        statement.kind,
        StatementKind::VariableDeclaration { .. }
            | StatementKind::Assignment { .. }
            | StatementKind::Expression(_)
    )
}

impl<'a> LuaPrinter<'a> {
    // =========================================================================
    // Statement lists
    // =========================================================================

    /// Newline-separated statements with a trailing newline; empty for no
    /// statements. Anything after a `return` is unreachable and not printed.
    pub(super) fn print_statement_array(&mut self, statements: &[Statement]) -> Vec<Chunk> {
        let mut printed: Vec<PrintedStatement> = Vec::with_capacity(statements.len());
        for (index, statement) in statements.iter().enumerate() {
            let current = self.print_statement(statement);
            if index > 0
                && may_require_semicolon(&statements[index - 1])
                && current.body.starts_with_parenthesis()
            {
                printed[index - 1].body.add(";");
            }
            printed.push(current);
            if statement.is_return() {
                break;
            }
        }

        if printed.is_empty() {
            return Vec::new();
        }
        let mut chunks = Vec::with_capacity(printed.len() * 2);
        for (index, statement) in printed.into_iter().enumerate() {
            if index > 0 {
                chunks.push("\n".into());
            }
            chunks.push(statement.into_node().into());
        }
        chunks.push("\n".into());
        chunks
    }

    pub(super) fn print_block(&mut self, block: &Block) -> SourceNode {
        SourceNode::concat(self.print_statement_array(&block.statements))
    }

    fn indented_block(&mut self, block: &Block) -> SourceNode {
        self.with_indent(|printer| printer.print_block(block))
    }

    fn print_statement(&mut self, statement: &Statement) -> PrintedStatement {
        let leading = (!statement.leading_comments.is_empty()).then(|| self.print_comments(&statement.leading_comments));
        let trailing = (!statement.trailing_comments.is_empty()).then(|| self.print_comments(&statement.trailing_comments));
        PrintedStatement {
            leading,
            body: self.print_statement_excluding_comments(statement),
            trailing,
        }
    }

    fn print_comments(&self, comments: &[Comment]) -> String {
        comments
            .iter()
            .map(|comment| self.print_comment(comment))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn print_comment(&self, comment: &Comment) -> String {
        let indent = &self.current_indent;
        match comment {
            Comment::Line(text) => format!("{indent}--{text}"),
            Comment::Block(lines) => match lines.split_first() {
                None => format!("{indent}--[[]]"),
                Some((first, rest)) => {
                    let mut out = format!("{indent}--[[{first}");
                    for line in rest {
                        out.push('\n');
                        out.push_str(indent);
                        out.push_str(line);
                    }
                    out.push_str("]]");
                    out
                }
            },
        }
    }

    fn print_statement_excluding_comments(&mut self, statement: &Statement) -> SourceNode {
        let position = statement.position;
        match &statement.kind {
            StatementKind::Do(block) => {
                let body = self.indented_block(block);
                SourceNode::concat(vec![
                    self.indent("do\n").into(),
                    body.into(),
                    self.indent("end").into(),
                ])
            }
            StatementKind::VariableDeclaration { left, right } => {
                let mut chunks: Vec<Chunk> = vec![self.indent("local ").into()];
                if statement.is_function_definition()
                    && let Some(function) = right[0].as_function()
                {
                    let name = self.print_identifier(&left[0]);
                    chunks.push(self.print_function_definition(name, function, right[0].position, position).into());
                } else {
                    let names = left.iter().map(|identifier| self.print_identifier(identifier)).collect();
                    chunks.extend(join_with_comma(names));
                    if !right.is_empty() {
                        chunks.push(" = ".into());
                        chunks.extend(self.print_joined(right));
                    }
                }
                self.source_node(position, chunks)
            }
            StatementKind::Assignment { left, right } => {
                let mut chunks: Vec<Chunk> = vec![self.indent_chunk()];
                if statement.is_function_definition()
                    && right[0].has_flags(NodeFlags::DECLARATION)
                    && let Some(function) = right[0].as_function()
                {
                    // `function a.b() ... end` when the target prints as a dotted name.
                    let name = self.print_expression(&left[0]);
                    if is_valid_function_declaration_name(&name.to_string(), self.allow_unicode()) {
                        chunks.push(self.print_function_definition(name, function, right[0].position, position).into());
                        return self.source_node(position, chunks);
                    }
                }
                chunks.extend(self.print_joined(left));
                chunks.push(" = ".into());
                chunks.extend(self.print_joined(right));
                self.source_node(position, chunks)
            }
            StatementKind::If(statement) => self.print_if_statement(statement, false),
            StatementKind::While { condition, body } => {
                let condition = self.print_expression(condition);
                let body = self.indented_block(body);
                SourceNode::concat(vec![
                    self.indent("while ").into(),
                    condition.into(),
                    " do\n".into(),
                    body.into(),
                    self.indent("end").into(),
                ])
            }
            StatementKind::Repeat { body, condition } => {
                let body = self.indented_block(body);
                let condition = self.print_expression(condition);
                SourceNode::concat(vec![
                    self.indent("repeat\n").into(),
                    body.into(),
                    self.indent("until ").into(),
                    condition.into(),
                ])
            }
            StatementKind::For {
                control_variable,
                init,
                limit,
                step,
                body,
            } => {
                let mut chunks: Vec<Chunk> = vec![
                    self.indent("for ").into(),
                    self.print_identifier(control_variable).into(),
                    " = ".into(),
                    self.print_expression(init).into(),
                    ", ".into(),
                    self.print_expression(limit).into(),
                ];
                if let Some(step) = step {
                    chunks.push(", ".into());
                    chunks.push(self.print_expression(step).into());
                }
                chunks.push(" do\n".into());
                chunks.push(self.indented_block(body).into());
                chunks.push(self.indent("end").into());
                SourceNode::concat(chunks)
            }
            StatementKind::ForIn {
                names,
                expressions,
                body,
            } => {
                let mut chunks: Vec<Chunk> = vec![self.indent("for ").into()];
                let names = names.iter().map(|name| self.print_identifier(name)).collect();
                chunks.extend(join_with_comma(names));
                chunks.push(" in ".into());
                chunks.extend(self.print_joined(expressions));
                chunks.push(" do\n".into());
                chunks.push(self.indented_block(body).into());
                chunks.push(self.indent("end").into());
                self.source_node(position, chunks)
            }
            StatementKind::Goto(label) => {
                self.source_node(position, vec![self.indent("goto ").into(), label.as_str().into()])
            }
            StatementKind::Label(name) => self.source_node(
                position,
                vec![self.indent("::").into(), name.as_str().into(), "::".into()],
            ),
            StatementKind::Return(expressions) => {
                if expressions.is_empty() {
                    return self.source_node(position, vec![self.indent("return").into()]);
                }
                let mut chunks = vec![self.indent_chunk(), "return ".into()];
                chunks.extend(self.print_joined(expressions));
                self.source_node(position, chunks)
            }
            StatementKind::Break => self.source_node(position, vec![self.indent("break").into()]),
            StatementKind::Expression(expression) => {
                let expression = self.print_expression(expression);
                self.source_node(position, vec![self.indent_chunk(), expression.into()])
            }
        }
    }

    fn print_if_statement(&mut self, statement: &IfStatement, is_else_if: bool) -> SourceNode {
        let keyword = if is_else_if { "elseif " } else { "if " };
        let mut chunks: Vec<Chunk> = vec![
            self.indent(keyword).into(),
            self.print_expression(&statement.condition).into(),
            " then\n".into(),
            self.indented_block(&statement.if_block).into(),
        ];
        match &statement.else_block {
            Some(ElseBranch::If(else_if)) => {
                chunks.push(self.print_if_statement(else_if, true).into());
            }
            Some(ElseBranch::Block(block)) => {
                chunks.push(self.indent("else\n").into());
                chunks.push(self.indented_block(block).into());
                chunks.push(self.indent("end").into());
            }
            None => chunks.push(self.indent("end").into()),
        }
        SourceNode::concat(chunks)
    }

    /// `function name(params) ... end`, the `local` prefix (if any) printed by the caller.
    fn print_function_definition(
        &mut self,
        name: SourceNode,
        function: &FunctionExpression,
        function_position: Option<SourcePosition>,
        statement_position: Option<SourcePosition>,
    ) -> SourceNode {
        let mut chunks: Vec<Chunk> = vec!["function ".into(), name.into(), "(".into()];
        chunks.extend(self.print_function_parameters(function));
        chunks.push(")\n".into());
        chunks.push(self.indented_block(&function.body).into());
        let end = self.source_node(statement_position, vec!["end".into()]);
        chunks.push(self.indent(end).into());
        self.source_node(function_position, chunks)
    }
}
