//! Typed source tree consumed by the lowering passes.
//!
//! The front end (parser + binder + checker) produces this tree; lowering
//! only reads it. Every node carries a [`NodeId`] used to ask the
//! [`Resolver`](crate::resolver::Resolver) type questions, and `pos`, the byte
//! offset of the node's first token in [`SourceFile::text`].
//!
//! Identifiers that name a binding carry the binder's [`SourceSymbol`].

use std::fmt;

/// Identity of a source node, unique within one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// Binder symbol for a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceSymbol(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub file_name: String,
    pub text: String,
    pub statements: Vec<Statement>,
    /// Files with top-level imports or exports.
    pub is_module: bool,
}

impl SourceFile {
    /// Leading `#!` line, kept verbatim in the output.
    pub fn shebang(&self) -> &str {
        if !self.text.starts_with("#!") {
            return "";
        }
        match self.text.find('\n') {
            Some(end) => &self.text[..=end],
            None => &self.text,
        }
    }
}

// =============================================================================
// Identifiers and names
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub id: NodeId,
    pub pos: u32,
    pub text: String,
    pub symbol: Option<SourceSymbol>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyName {
    Identifier(String),
    String(String),
    Numeric(f64),
    Computed(Box<Expression>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum BindingName {
    Identifier(Ident),
    /// `[a, , b = 1, ...rest]`; `None` for omitted elements
    Array(Vec<Option<BindingElement>>),
    /// `{ a, b: c, ...rest }`
    Object(Vec<BindingElement>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BindingElement {
    pub pos: u32,
    pub property_name: Option<PropertyName>,
    pub name: BindingName,
    pub initializer: Option<Expression>,
    pub rest: bool,
}

// =============================================================================
// Expressions
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrefixOperator {
    Plus,
    Minus,
    /// `!`
    Not,
    /// `~`
    Tilde,
    Increment,
    Decrement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostfixOperator {
    Increment,
    Decrement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Plus,
    Minus,
    Asterisk,
    Slash,
    Percent,
    AsteriskAsterisk,
    LessThan,
    LessThanEquals,
    GreaterThan,
    GreaterThanEquals,
    EqualsEquals,
    EqualsEqualsEquals,
    ExclamationEquals,
    ExclamationEqualsEquals,
    AmpersandAmpersand,
    BarBar,
    QuestionQuestion,
    Ampersand,
    Bar,
    Caret,
    LessThanLessThan,
    GreaterThanGreaterThan,
    GreaterThanGreaterThanGreaterThan,
    Comma,
    In,
    Equals,
    PlusEquals,
    MinusEquals,
    AsteriskEquals,
    SlashEquals,
    PercentEquals,
    AsteriskAsteriskEquals,
    AmpersandEquals,
    BarEquals,
    CaretEquals,
    LessThanLessThanEquals,
    GreaterThanGreaterThanEquals,
    GreaterThanGreaterThanGreaterThanEquals,
    AmpersandAmpersandEquals,
    BarBarEquals,
    QuestionQuestionEquals,
}

impl BinaryOperator {
    /// `+=` -> `+`, `??=` -> `??`; `None` for non-compound operators.
    pub fn compound_base(self) -> Option<BinaryOperator> {
        use BinaryOperator::*;
        Some(match self {
            PlusEquals => Plus,
            MinusEquals => Minus,
            AsteriskEquals => Asterisk,
            SlashEquals => Slash,
            PercentEquals => Percent,
            AsteriskAsteriskEquals => AsteriskAsterisk,
            AmpersandEquals => Ampersand,
            BarEquals => Bar,
            CaretEquals => Caret,
            LessThanLessThanEquals => LessThanLessThan,
            GreaterThanGreaterThanEquals => GreaterThanGreaterThan,
            GreaterThanGreaterThanGreaterThanEquals => GreaterThanGreaterThanGreaterThan,
            AmpersandAmpersandEquals => AmpersandAmpersand,
            BarBarEquals => BarBar,
            QuestionQuestionEquals => QuestionQuestion,
            _ => return None,
        })
    }

    pub fn is_short_circuit(self) -> bool {
        matches!(
            self,
            BinaryOperator::AmpersandAmpersand | BinaryOperator::BarBar | BinaryOperator::QuestionQuestion
        )
    }

    pub fn is_bitwise(self) -> bool {
        matches!(
            self,
            BinaryOperator::Ampersand
                | BinaryOperator::Bar
                | BinaryOperator::Caret
                | BinaryOperator::LessThanLessThan
                | BinaryOperator::GreaterThanGreaterThan
                | BinaryOperator::GreaterThanGreaterThanGreaterThan
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateSpan {
    pub expression: Expression,
    /// Literal text following the expression.
    pub literal: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectMember {
    Property { name: PropertyName, value: Expression },
    Shorthand(Ident),
    Spread(Expression),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    Declaration,
    Expression,
    Arrow,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub pos: u32,
    pub name: BindingName,
    pub initializer: Option<Expression>,
    pub rest: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FunctionBody {
    Block(Vec<Statement>),
    /// Arrow function with an expression body.
    Expression(Box<Expression>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionLike {
    pub id: NodeId,
    pub pos: u32,
    pub kind: FunctionKind,
    pub name: Option<Ident>,
    pub parameters: Vec<Parameter>,
    pub body: FunctionBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionKind {
    Identifier(Ident),
    This,
    Null,
    Undefined,
    True,
    False,
    Numeric(f64),
    String(String),
    Template { head: String, spans: Vec<TemplateSpan> },
    Array(Vec<Expression>),
    Object(Vec<ObjectMember>),
    Spread(Box<Expression>),
    Parenthesized(Box<Expression>),
    PropertyAccess { expression: Box<Expression>, name: String },
    ElementAccess { expression: Box<Expression>, argument: Box<Expression> },
    Call { callee: Box<Expression>, arguments: Vec<Expression> },
    Prefix { operator: PrefixOperator, operand: Box<Expression> },
    Postfix { operator: PostfixOperator, operand: Box<Expression> },
    Binary { operator: BinaryOperator, left: Box<Expression>, right: Box<Expression> },
    Conditional { condition: Box<Expression>, when_true: Box<Expression>, when_false: Box<Expression> },
    Function(Box<FunctionLike>),
    /// `a?.b.c`, `a?.[k]`, `a?.()`. The chain after `?.` is `continuation`,
    /// built on an [`ExpressionKind::OptionalContinuation`] that stands for
    /// the non-nil value of `expression`.
    OptionalChain { expression: Box<Expression>, continuation: Box<Expression> },
    OptionalContinuation,
    /// A construct the front end parsed but lowering does not handle.
    Unsupported { kind: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub id: NodeId,
    pub pos: u32,
    pub kind: ExpressionKind,
}

impl Expression {
    /// Strip parentheses.
    pub fn skip_outer(&self) -> &Expression {
        let mut expression = self;
        while let ExpressionKind::Parenthesized(inner) = &expression.kind {
            expression = inner;
        }
        expression
    }

    pub fn is_spread(&self) -> bool {
        matches!(self.kind, ExpressionKind::Spread(_))
    }

    pub fn syntax_kind(&self) -> SyntaxKind {
        match &self.kind {
            ExpressionKind::Identifier(_) => SyntaxKind::Identifier,
            ExpressionKind::This => SyntaxKind::ThisKeyword,
            ExpressionKind::Null => SyntaxKind::NullKeyword,
            ExpressionKind::Undefined => SyntaxKind::UndefinedKeyword,
            ExpressionKind::True => SyntaxKind::TrueKeyword,
            ExpressionKind::False => SyntaxKind::FalseKeyword,
            ExpressionKind::Numeric(_) => SyntaxKind::NumericLiteral,
            ExpressionKind::String(_) => SyntaxKind::StringLiteral,
            ExpressionKind::Template { .. } => SyntaxKind::TemplateExpression,
            ExpressionKind::Array(_) => SyntaxKind::ArrayLiteralExpression,
            ExpressionKind::Object(_) => SyntaxKind::ObjectLiteralExpression,
            ExpressionKind::Spread(_) => SyntaxKind::SpreadElement,
            ExpressionKind::Parenthesized(_) => SyntaxKind::ParenthesizedExpression,
            ExpressionKind::PropertyAccess { .. } => SyntaxKind::PropertyAccessExpression,
            ExpressionKind::ElementAccess { .. } => SyntaxKind::ElementAccessExpression,
            ExpressionKind::Call { .. } => SyntaxKind::CallExpression,
            ExpressionKind::Prefix { .. } => SyntaxKind::PrefixUnaryExpression,
            ExpressionKind::Postfix { .. } => SyntaxKind::PostfixUnaryExpression,
            ExpressionKind::Binary { .. } => SyntaxKind::BinaryExpression,
            ExpressionKind::Conditional { .. } => SyntaxKind::ConditionalExpression,
            ExpressionKind::Function(function) => match function.kind {
                FunctionKind::Arrow => SyntaxKind::ArrowFunction,
                _ => SyntaxKind::FunctionExpression,
            },
            ExpressionKind::OptionalChain { .. } => SyntaxKind::OptionalChain,
            ExpressionKind::OptionalContinuation => SyntaxKind::OptionalContinuation,
            ExpressionKind::Unsupported { .. } => SyntaxKind::Unknown,
        }
    }
}

// =============================================================================
// Statements
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    Var,
    Let,
    Const,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaration {
    pub id: NodeId,
    pub pos: u32,
    pub name: BindingName,
    pub initializer: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeclarationList {
    pub pos: u32,
    pub kind: DeclarationKind,
    pub declarations: Vec<VariableDeclaration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub export: bool,
    /// `declare`: ambient, produces no code
    pub declare: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForInitializer {
    Declarations(DeclarationList),
    Expression(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseClause {
    pub pos: u32,
    /// `None` for `default:`
    pub test: Option<Expression>,
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub pos: u32,
    pub binding: Option<BindingName>,
    pub block: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportSpecifier {
    pub pos: u32,
    /// `a` in `import { a as b }`
    pub property_name: Option<String>,
    pub name: Ident,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NamedImports {
    /// `* as ns`
    Namespace(Ident),
    Named(Vec<ImportSpecifier>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportClause {
    pub default: Option<Ident>,
    pub named: Option<NamedImports>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    Variable {
        list: DeclarationList,
        modifiers: Modifiers,
        /// Documentation comment text, without comment markers.
        jsdoc: Option<String>,
    },
    Function {
        function: Box<FunctionLike>,
        modifiers: Modifiers,
        jsdoc: Option<String>,
    },
    Expression(Expression),
    Return(Option<Expression>),
    If {
        condition: Expression,
        then_statement: Box<Statement>,
        else_statement: Option<Box<Statement>>,
    },
    Block(Vec<Statement>),
    While {
        condition: Expression,
        body: Box<Statement>,
    },
    DoWhile {
        body: Box<Statement>,
        condition: Expression,
    },
    For {
        initializer: Option<ForInitializer>,
        condition: Option<Expression>,
        incrementor: Option<Expression>,
        body: Box<Statement>,
    },
    ForOf {
        initializer: ForInitializer,
        expression: Expression,
        body: Box<Statement>,
    },
    Switch {
        expression: Expression,
        clauses: Vec<CaseClause>,
    },
    Break,
    Continue {
        label: Option<String>,
    },
    Throw(Expression),
    Try {
        try_block: Vec<Statement>,
        catch_clause: Option<CatchClause>,
        finally_block: Option<Vec<Statement>>,
    },
    Import {
        module_specifier: String,
        clause: Option<ImportClause>,
    },
    Empty,
    Unsupported {
        kind: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub id: NodeId,
    pub pos: u32,
    pub kind: StatementKind,
}

impl Statement {
    pub fn syntax_kind(&self) -> SyntaxKind {
        match &self.kind {
            StatementKind::Variable { .. } => SyntaxKind::VariableStatement,
            StatementKind::Function { .. } => SyntaxKind::FunctionDeclaration,
            StatementKind::Expression(_) => SyntaxKind::ExpressionStatement,
            StatementKind::Return(_) => SyntaxKind::ReturnStatement,
            StatementKind::If { .. } => SyntaxKind::IfStatement,
            StatementKind::Block(_) => SyntaxKind::Block,
            StatementKind::While { .. } => SyntaxKind::WhileStatement,
            StatementKind::DoWhile { .. } => SyntaxKind::DoStatement,
            StatementKind::For { .. } => SyntaxKind::ForStatement,
            StatementKind::ForOf { .. } => SyntaxKind::ForOfStatement,
            StatementKind::Switch { .. } => SyntaxKind::SwitchStatement,
            StatementKind::Break => SyntaxKind::BreakStatement,
            StatementKind::Continue { .. } => SyntaxKind::ContinueStatement,
            StatementKind::Throw(_) => SyntaxKind::ThrowStatement,
            StatementKind::Try { .. } => SyntaxKind::TryStatement,
            StatementKind::Import { .. } => SyntaxKind::ImportDeclaration,
            StatementKind::Empty => SyntaxKind::EmptyStatement,
            StatementKind::Unsupported { .. } => SyntaxKind::Unknown,
        }
    }

    /// `break` or `return` directly in this statement or a nested block.
    pub fn contains_break_or_return(statements: &[Statement]) -> bool {
        statements.iter().any(|statement| match &statement.kind {
            StatementKind::Break | StatementKind::Return(_) => true,
            StatementKind::Block(inner) => Statement::contains_break_or_return(inner),
            _ => false,
        })
    }
}

/// Node kind used to key visitor overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxKind {
    Unknown,
    // Expressions
    Identifier,
    ThisKeyword,
    NullKeyword,
    UndefinedKeyword,
    TrueKeyword,
    FalseKeyword,
    NumericLiteral,
    StringLiteral,
    TemplateExpression,
    ArrayLiteralExpression,
    ObjectLiteralExpression,
    SpreadElement,
    ParenthesizedExpression,
    PropertyAccessExpression,
    ElementAccessExpression,
    CallExpression,
    PrefixUnaryExpression,
    PostfixUnaryExpression,
    BinaryExpression,
    ConditionalExpression,
    FunctionExpression,
    ArrowFunction,
    OptionalChain,
    OptionalContinuation,
    // Statements
    VariableStatement,
    FunctionDeclaration,
    ExpressionStatement,
    ReturnStatement,
    IfStatement,
    Block,
    WhileStatement,
    DoStatement,
    ForStatement,
    ForOfStatement,
    SwitchStatement,
    BreakStatement,
    ContinueStatement,
    ThrowStatement,
    TryStatement,
    ImportDeclaration,
    EmptyStatement,
}

impl fmt::Display for SyntaxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
