//! Lua syntax tree nodes.
//!
//! # Structure
//!
//! - [`File`]: top-level statement list plus the runtime library features it uses
//! - [`Statement`]: a [`StatementKind`] with position, comments and an optional
//!   [`StatementId`] used by hoisting to find the statement again
//! - [`Expression`]: an [`ExpressionKind`] with position and [`NodeFlags`]
//!
//! Construction helpers mirror the Lua syntax they produce
//! (`Statement::local`, `Expression::call`, ...). No validation happens
//! beyond what the types enforce; building, say, an assignment with an
//! empty left side is a caller bug.

use crate::operators::{BinaryOperator, UnaryOperator};
use bitflags::bitflags;
use std::collections::BTreeSet;
use tslua_common::{LuaLibFeature, SourcePosition};

/// Identity of a source declaration within one file's lowering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

impl SymbolId {
    /// Marks compiler-generated temporaries. Temps are never reassigned
    /// between their definition and use, so they are safe to reorder around.
    pub const TEMP: SymbolId = SymbolId(u32::MAX);

    pub fn is_temp(self) -> bool {
        self == SymbolId::TEMP
    }
}

/// Handle to a statement registered as a hoisting candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatementId(pub u32);

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct NodeFlags: u8 {
        /// Function literal whose body is a single `return`, printed on one line.
        const INLINE = 1 << 0;
        /// Function literal that came from a function declaration.
        const DECLARATION = 1 << 1;
        /// Call to `unpack`/`table.unpack` produced for a spread.
        const TABLE_UNPACK_CALL = 1 << 2;
    }
}

// =============================================================================
// Identifiers
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub text: String,
    /// Whether an exported binding may be rewritten to `____exports.<text>`.
    pub exportable: bool,
    /// Source name, recorded in source map `names` when it differs from `text`.
    pub original_name: Option<String>,
    /// Resolver symbol; identifiers without one never take part in hoisting.
    pub symbol_id: Option<SymbolId>,
    pub position: Option<SourcePosition>,
}

impl Identifier {
    pub fn new(text: impl Into<String>) -> Self {
        Identifier {
            text: text.into(),
            exportable: true,
            original_name: None,
            symbol_id: None,
            position: None,
        }
    }

    /// A compiler temporary.
    pub fn temp(text: impl Into<String>) -> Self {
        Identifier {
            symbol_id: Some(SymbolId::TEMP),
            ..Identifier::new(text)
        }
    }

    pub fn with_symbol(mut self, symbol_id: Option<SymbolId>) -> Self {
        self.symbol_id = symbol_id;
        self
    }

    pub fn with_original_name(mut self, name: impl Into<String>) -> Self {
        self.original_name = Some(name.into());
        self
    }

    pub fn with_position(mut self, position: Option<SourcePosition>) -> Self {
        self.position = position;
        self
    }

    pub fn is_temp(&self) -> bool {
        self.symbol_id.is_some_and(SymbolId::is_temp)
    }
}

// =============================================================================
// Expressions
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionExpression {
    pub params: Vec<Identifier>,
    /// Trailing `...` parameter.
    pub dots: bool,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableField {
    pub value: Expression,
    /// `None` for positional (array part) fields.
    pub key: Option<Expression>,
    pub position: Option<SourcePosition>,
}

impl TableField {
    pub fn positional(value: Expression) -> Self {
        let position = value.position;
        TableField {
            value,
            key: None,
            position,
        }
    }

    pub fn keyed(key: Expression, value: Expression) -> Self {
        let position = key.position;
        TableField {
            value,
            key: Some(key),
            position,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionKind {
    // =========================================================================
    // Literals
    // =========================================================================
    /// `nil`
    Nil,
    /// `...`
    Dots,
    /// `arg` (Lua 5.0 varargs table)
    Arg,
    /// `true` / `false`
    Boolean(bool),
    /// `42`, `3.5`
    Numeric(f64),
    /// `"text"`; holds the unescaped value
    String(String),

    // =========================================================================
    // Constructors
    // =========================================================================
    /// `function(params) body end`
    Function(Box<FunctionExpression>),
    /// `{a, b, key = c}`
    Table(Vec<TableField>),

    // =========================================================================
    // Operators
    // =========================================================================
    Unary {
        operator: UnaryOperator,
        operand: Box<Expression>,
    },
    Binary {
        operator: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },

    // =========================================================================
    // Calls and access
    // =========================================================================
    /// `callee(params)`
    Call {
        expression: Box<Expression>,
        params: Vec<Expression>,
    },
    /// `prefix:name(params)`
    MethodCall {
        prefix: Box<Expression>,
        name: Identifier,
        params: Vec<Expression>,
    },
    Identifier(Identifier),
    /// `table[index]`, printed as `table.index` for identifier-like string keys
    TableIndex {
        table: Box<Expression>,
        index: Box<Expression>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub kind: ExpressionKind,
    pub position: Option<SourcePosition>,
    pub flags: NodeFlags,
}

impl Expression {
    pub fn new(kind: ExpressionKind) -> Self {
        Expression {
            kind,
            position: None,
            flags: NodeFlags::empty(),
        }
    }

    pub fn with_position(mut self, position: Option<SourcePosition>) -> Self {
        self.position = position;
        self
    }

    /// OR `flags` into this node's flags.
    pub fn set_flags(mut self, flags: NodeFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn has_flags(&self, flags: NodeFlags) -> bool {
        self.flags.contains(flags)
    }

    pub fn nil() -> Self {
        Expression::new(ExpressionKind::Nil)
    }

    pub fn dots() -> Self {
        Expression::new(ExpressionKind::Dots)
    }

    pub fn boolean(value: bool) -> Self {
        Expression::new(ExpressionKind::Boolean(value))
    }

    pub fn number(value: f64) -> Self {
        Expression::new(ExpressionKind::Numeric(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expression::new(ExpressionKind::String(value.into()))
    }

    pub fn identifier(text: impl Into<String>) -> Self {
        Expression::from(Identifier::new(text))
    }

    pub fn function(params: Vec<Identifier>, dots: bool, body: Block) -> Self {
        Expression::new(ExpressionKind::Function(Box::new(FunctionExpression {
            params,
            dots,
            body,
        })))
    }

    pub fn table(fields: Vec<TableField>) -> Self {
        Expression::new(ExpressionKind::Table(fields))
    }

    /// `{a, b, c}` from positional values.
    pub fn table_of(values: Vec<Expression>) -> Self {
        Expression::table(values.into_iter().map(TableField::positional).collect())
    }

    pub fn unary(operator: UnaryOperator, operand: Expression) -> Self {
        Expression::new(ExpressionKind::Unary {
            operator,
            operand: Box::new(operand),
        })
    }

    pub fn binary(left: Expression, operator: BinaryOperator, right: Expression) -> Self {
        Expression::new(ExpressionKind::Binary {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn call(callee: Expression, params: Vec<Expression>) -> Self {
        Expression::new(ExpressionKind::Call {
            expression: Box::new(callee),
            params,
        })
    }

    pub fn method_call(prefix: Expression, name: impl Into<String>, params: Vec<Expression>) -> Self {
        Expression::new(ExpressionKind::MethodCall {
            prefix: Box::new(prefix),
            name: Identifier::new(name),
            params,
        })
    }

    pub fn table_index(table: Expression, index: Expression) -> Self {
        Expression::new(ExpressionKind::TableIndex {
            table: Box::new(table),
            index: Box::new(index),
        })
    }

    /// `table.name`
    pub fn property(table: Expression, name: impl Into<String>) -> Self {
        Expression::table_index(table, Expression::string(name))
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Literals are side-effect free and never need snapshotting.
    pub fn is_literal(&self) -> bool {
        matches!(
            self.kind,
            ExpressionKind::Nil
                | ExpressionKind::Dots
                | ExpressionKind::Boolean(_)
                | ExpressionKind::Numeric(_)
                | ExpressionKind::String(_)
        )
    }

    pub fn is_assignment_left_hand_side(&self) -> bool {
        matches!(
            self.kind,
            ExpressionKind::Identifier(_) | ExpressionKind::TableIndex { .. }
        )
    }

    pub fn as_identifier(&self) -> Option<&Identifier> {
        match &self.kind {
            ExpressionKind::Identifier(identifier) => Some(identifier),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionExpression> {
        match &self.kind {
            ExpressionKind::Function(function) => Some(function),
            _ => None,
        }
    }

    pub fn string_value(&self) -> Option<&str> {
        match &self.kind {
            ExpressionKind::String(value) => Some(value),
            _ => None,
        }
    }

    /// Value of a numeric literal, looking through a single negation.
    pub fn number_value(&self) -> Option<f64> {
        match &self.kind {
            ExpressionKind::Numeric(value) => Some(*value),
            ExpressionKind::Unary {
                operator: UnaryOperator::Negation,
                operand,
            } => match operand.kind {
                ExpressionKind::Numeric(value) => Some(-value),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn is_call(&self) -> bool {
        matches!(
            self.kind,
            ExpressionKind::Call { .. } | ExpressionKind::MethodCall { .. }
        )
    }

    pub fn is_unpack_call(&self) -> bool {
        matches!(self.kind, ExpressionKind::Call { .. })
            && self.has_flags(NodeFlags::TABLE_UNPACK_CALL)
    }

    /// Function literal printed as `function(a) return x end`.
    pub fn is_inline_function_expression(&self) -> bool {
        match &self.kind {
            ExpressionKind::Function(function) => {
                self.has_flags(NodeFlags::INLINE)
                    && function.body.statements.len() == 1
                    && matches!(function.body.statements[0].kind, StatementKind::Return(_))
            }
            _ => false,
        }
    }
}

impl From<Identifier> for Expression {
    fn from(identifier: Identifier) -> Self {
        let position = identifier.position;
        Expression::new(ExpressionKind::Identifier(identifier)).with_position(position)
    }
}

// =============================================================================
// Statements
// =============================================================================

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub statements: Vec<Statement>,
}

impl Block {
    pub fn new(statements: Vec<Statement>) -> Self {
        Block { statements }
    }
}

impl From<Vec<Statement>> for Block {
    fn from(statements: Vec<Statement>) -> Self {
        Block { statements }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Comment {
    /// `--text`
    Line(String),
    /// `--[[first\nrest...]]`
    Block(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    pub condition: Expression,
    pub if_block: Block,
    pub else_block: Option<ElseBranch>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElseBranch {
    Block(Block),
    /// Printed as `elseif`.
    If(Box<IfStatement>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    /// `do ... end`
    Do(Block),
    /// `local a, b = x, y`; empty `right` means no initializer
    VariableDeclaration {
        left: Vec<Identifier>,
        right: Vec<Expression>,
    },
    /// `a, t[k] = x, y`; every left element is an identifier or table index
    Assignment {
        left: Vec<Expression>,
        right: Vec<Expression>,
    },
    If(IfStatement),
    While {
        condition: Expression,
        body: Block,
    },
    /// `repeat ... until condition`
    Repeat {
        body: Block,
        condition: Expression,
    },
    /// `for i = init, limit[, step] do ... end`
    For {
        control_variable: Identifier,
        init: Expression,
        limit: Expression,
        step: Option<Expression>,
        body: Block,
    },
    /// `for names in expressions do ... end`
    ForIn {
        names: Vec<Identifier>,
        expressions: Vec<Expression>,
        body: Block,
    },
    Goto(String),
    /// `::name::`
    Label(String),
    Return(Vec<Expression>),
    Break,
    Expression(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub kind: StatementKind,
    pub position: Option<SourcePosition>,
    /// Set when the statement is registered for hoisting.
    pub id: Option<StatementId>,
    pub leading_comments: Vec<Comment>,
    pub trailing_comments: Vec<Comment>,
}

impl Statement {
    pub fn new(kind: StatementKind) -> Self {
        Statement {
            kind,
            position: None,
            id: None,
            leading_comments: Vec::new(),
            trailing_comments: Vec::new(),
        }
    }

    pub fn with_position(mut self, position: Option<SourcePosition>) -> Self {
        self.position = position;
        self
    }

    pub fn with_id(mut self, id: StatementId) -> Self {
        self.id = Some(id);
        self
    }

    /// Deep copy that is not registered anywhere.
    pub fn clone_node(&self) -> Self {
        Statement {
            id: None,
            ..self.clone()
        }
    }

    pub fn local(left: Vec<Identifier>, right: Vec<Expression>) -> Self {
        Statement::new(StatementKind::VariableDeclaration { left, right })
    }

    pub fn assign(left: Vec<Expression>, right: Vec<Expression>) -> Self {
        Statement::new(StatementKind::Assignment { left, right })
    }

    pub fn expression(expression: Expression) -> Self {
        Statement::new(StatementKind::Expression(expression))
    }

    pub fn ret(expressions: Vec<Expression>) -> Self {
        Statement::new(StatementKind::Return(expressions))
    }

    pub fn do_block(statements: Vec<Statement>) -> Self {
        Statement::new(StatementKind::Do(Block::new(statements)))
    }

    pub fn if_then(condition: Expression, if_block: Block, else_block: Option<ElseBranch>) -> Self {
        Statement::new(StatementKind::If(IfStatement {
            condition,
            if_block,
            else_block,
        }))
    }

    pub fn while_loop(condition: Expression, body: Block) -> Self {
        Statement::new(StatementKind::While { condition, body })
    }

    pub fn repeat_until(body: Block, condition: Expression) -> Self {
        Statement::new(StatementKind::Repeat { body, condition })
    }

    pub fn numeric_for(
        control_variable: Identifier,
        init: Expression,
        limit: Expression,
        step: Option<Expression>,
        body: Block,
    ) -> Self {
        Statement::new(StatementKind::For {
            control_variable,
            init,
            limit,
            step,
            body,
        })
    }

    pub fn for_in(names: Vec<Identifier>, expressions: Vec<Expression>, body: Block) -> Self {
        Statement::new(StatementKind::ForIn {
            names,
            expressions,
            body,
        })
    }

    pub fn goto(label: impl Into<String>) -> Self {
        Statement::new(StatementKind::Goto(label.into()))
    }

    pub fn label(name: impl Into<String>) -> Self {
        Statement::new(StatementKind::Label(name.into()))
    }

    pub fn break_loop() -> Self {
        Statement::new(StatementKind::Break)
    }

    pub fn is_return(&self) -> bool {
        matches!(self.kind, StatementKind::Return(_))
    }

    /// `local f = function() end` or `f = function() end` with a single target.
    pub fn is_function_definition(&self) -> bool {
        let (left_len, right) = match &self.kind {
            StatementKind::VariableDeclaration { left, right } => (left.len(), right),
            StatementKind::Assignment { left, right } => (left.len(), right),
            _ => return false,
        };
        left_len == 1 && right.len() == 1 && right[0].as_function().is_some()
    }
}

// =============================================================================
// File
// =============================================================================

#[derive(Debug, Clone, PartialEq, Default)]
pub struct File {
    pub statements: Vec<Statement>,
    pub lualib_features: BTreeSet<LuaLibFeature>,
    /// Leading text copied verbatim (e.g. a shebang line).
    pub trivia: String,
}

impl File {
    pub fn new(statements: Vec<Statement>) -> Self {
        File {
            statements,
            ..Default::default()
        }
    }
}

#[cfg(test)]
#[path = "../tests/node.rs"]
mod tests;
