//! Programmatic construction of typed source trees.
//!
//! Front ends that already own a parsed and checked tree convert it to
//! [`SourceFile`] directly. Everything else (tests, benches, embedders
//! generating code) uses [`SourceBuilder`]:
//!
//! ```ignore
//! let b = SourceBuilder::new();
//! let x = b.symbol("x", SymbolFlags::empty());
//! let stmts = vec![b.let_(x, Some(b.number(1.0))), b.expression_statement(b.id(x))];
//! let (file, table) = b.finish("main.ts", stmts);
//! ```
//!
//! # Positions
//!
//! Nodes are created inside-out, so positions cannot be assigned eagerly.
//! [`SourceBuilder::finish`] walks the finished tree in source order, gives
//! every node the next offset and synthesizes matching source text (one line
//! per statement). Declaration positions of symbols are recorded during the
//! same walk, which is what hoisting compares first uses against.

use crate::resolver::{ContextType, SymbolFlags, SymbolTable, TypeFacts};
use crate::source::*;
use std::cell::{Cell, RefCell};

pub struct SourceBuilder {
    next_node: Cell<u32>,
    table: RefCell<SymbolTable>,
}

impl Default for SourceBuilder {
    fn default() -> Self {
        SourceBuilder::new()
    }
}

impl SourceBuilder {
    pub fn new() -> Self {
        SourceBuilder {
            next_node: Cell::new(0),
            table: RefCell::new(SymbolTable::new()),
        }
    }

    fn node_id(&self) -> NodeId {
        let id = self.next_node.get();
        self.next_node.set(id + 1);
        NodeId(id)
    }

    pub fn symbol(&self, name: &str, flags: SymbolFlags) -> SourceSymbol {
        self.table.borrow_mut().add_symbol(name, flags)
    }

    /// Attach checker facts to an expression.
    pub fn typed(&self, expression: Expression, facts: TypeFacts) -> Expression {
        self.table.borrow_mut().set_type_facts(expression.id, facts);
        expression
    }

    /// Set the calling convention of a function node or call target.
    pub fn with_context(&self, expression: Expression, context_type: ContextType) -> Expression {
        let node = match &expression.kind {
            ExpressionKind::Function(function) => function.id,
            _ => expression.id,
        };
        self.table.borrow_mut().set_context_type(node, context_type);
        expression
    }

    // =========================================================================
    // Identifiers
    // =========================================================================

    pub fn ident(&self, symbol: SourceSymbol) -> Ident {
        let text = self
            .table
            .borrow()
            .symbol(symbol)
            .map(|entry| entry.name.clone())
            .expect("symbol was not created by this builder");
        Ident {
            id: self.node_id(),
            pos: 0,
            text,
            symbol: Some(symbol),
        }
    }

    /// Identifier the binder could not resolve (an ambient global).
    pub fn global_ident(&self, name: &str) -> Ident {
        Ident {
            id: self.node_id(),
            pos: 0,
            text: name.to_string(),
            symbol: None,
        }
    }

    pub fn binding(&self, symbol: SourceSymbol) -> BindingName {
        BindingName::Identifier(self.ident(symbol))
    }

    pub fn array_pattern(&self, elements: Vec<Option<BindingElement>>) -> BindingName {
        BindingName::Array(elements)
    }

    pub fn object_pattern(&self, elements: Vec<BindingElement>) -> BindingName {
        BindingName::Object(elements)
    }

    pub fn element(&self, name: BindingName) -> BindingElement {
        BindingElement {
            pos: 0,
            property_name: None,
            name,
            initializer: None,
            rest: false,
        }
    }

    /// `{ key: name }` element of an object pattern.
    pub fn property_element(&self, key: &str, name: BindingName) -> BindingElement {
        BindingElement {
            property_name: Some(PropertyName::Identifier(key.to_string())),
            ..self.element(name)
        }
    }

    pub fn element_with_default(&self, name: BindingName, initializer: Expression) -> BindingElement {
        BindingElement {
            initializer: Some(initializer),
            ..self.element(name)
        }
    }

    pub fn rest_element(&self, name: BindingName) -> BindingElement {
        BindingElement {
            rest: true,
            ..self.element(name)
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn expression(&self, kind: ExpressionKind) -> Expression {
        Expression {
            id: self.node_id(),
            pos: 0,
            kind,
        }
    }

    pub fn id(&self, symbol: SourceSymbol) -> Expression {
        let ident = self.ident(symbol);
        self.expression(ExpressionKind::Identifier(ident))
    }

    pub fn global(&self, name: &str) -> Expression {
        let ident = self.global_ident(name);
        self.expression(ExpressionKind::Identifier(ident))
    }

    pub fn number(&self, value: f64) -> Expression {
        self.expression(ExpressionKind::Numeric(value))
    }

    pub fn string(&self, value: &str) -> Expression {
        self.expression(ExpressionKind::String(value.to_string()))
    }

    pub fn boolean(&self, value: bool) -> Expression {
        self.expression(if value {
            ExpressionKind::True
        } else {
            ExpressionKind::False
        })
    }

    pub fn null(&self) -> Expression {
        self.expression(ExpressionKind::Null)
    }

    pub fn undefined(&self) -> Expression {
        self.expression(ExpressionKind::Undefined)
    }

    pub fn this(&self) -> Expression {
        self.expression(ExpressionKind::This)
    }

    pub fn call(&self, callee: Expression, arguments: Vec<Expression>) -> Expression {
        self.expression(ExpressionKind::Call {
            callee: Box::new(callee),
            arguments,
        })
    }

    /// `name(arguments)` for an unresolved global function.
    pub fn call_global(&self, name: &str, arguments: Vec<Expression>) -> Expression {
        let callee = self.global(name);
        self.call(callee, arguments)
    }

    pub fn prop(&self, object: Expression, name: &str) -> Expression {
        self.expression(ExpressionKind::PropertyAccess {
            expression: Box::new(object),
            name: name.to_string(),
        })
    }

    pub fn elem(&self, object: Expression, argument: Expression) -> Expression {
        self.expression(ExpressionKind::ElementAccess {
            expression: Box::new(object),
            argument: Box::new(argument),
        })
    }

    /// `object?.<continuation>`; `continuation` is built on [`Self::continuation`].
    pub fn optional_chain(&self, object: Expression, continuation: Expression) -> Expression {
        self.expression(ExpressionKind::OptionalChain {
            expression: Box::new(object),
            continuation: Box::new(continuation),
        })
    }

    /// The value left of the innermost `?.`.
    pub fn continuation(&self) -> Expression {
        self.expression(ExpressionKind::OptionalContinuation)
    }

    pub fn optional_prop(&self, object: Expression, name: &str) -> Expression {
        let continuation = self.prop(self.continuation(), name);
        self.optional_chain(object, continuation)
    }

    pub fn optional_call(&self, callee: Expression, arguments: Vec<Expression>) -> Expression {
        let continuation = self.call(self.continuation(), arguments);
        self.optional_chain(callee, continuation)
    }

    pub fn binary(&self, left: Expression, operator: BinaryOperator, right: Expression) -> Expression {
        self.expression(ExpressionKind::Binary {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn assign(&self, left: Expression, right: Expression) -> Expression {
        self.binary(left, BinaryOperator::Equals, right)
    }

    pub fn prefix(&self, operator: PrefixOperator, operand: Expression) -> Expression {
        self.expression(ExpressionKind::Prefix {
            operator,
            operand: Box::new(operand),
        })
    }

    pub fn postfix(&self, operator: PostfixOperator, operand: Expression) -> Expression {
        self.expression(ExpressionKind::Postfix {
            operator,
            operand: Box::new(operand),
        })
    }

    pub fn conditional(&self, condition: Expression, when_true: Expression, when_false: Expression) -> Expression {
        self.expression(ExpressionKind::Conditional {
            condition: Box::new(condition),
            when_true: Box::new(when_true),
            when_false: Box::new(when_false),
        })
    }

    pub fn array(&self, elements: Vec<Expression>) -> Expression {
        self.expression(ExpressionKind::Array(elements))
    }

    pub fn object(&self, members: Vec<ObjectMember>) -> Expression {
        self.expression(ExpressionKind::Object(members))
    }

    pub fn property(&self, name: &str, value: Expression) -> ObjectMember {
        ObjectMember::Property {
            name: PropertyName::Identifier(name.to_string()),
            value,
        }
    }

    pub fn spread(&self, expression: Expression) -> Expression {
        self.expression(ExpressionKind::Spread(Box::new(expression)))
    }

    pub fn paren(&self, expression: Expression) -> Expression {
        self.expression(ExpressionKind::Parenthesized(Box::new(expression)))
    }

    pub fn template(&self, head: &str, spans: Vec<(Expression, &str)>) -> Expression {
        let spans = spans
            .into_iter()
            .map(|(expression, literal)| TemplateSpan {
                expression,
                literal: literal.to_string(),
            })
            .collect();
        self.expression(ExpressionKind::Template {
            head: head.to_string(),
            spans,
        })
    }

    pub fn param(&self, symbol: SourceSymbol) -> Parameter {
        self.pattern_param(self.binding(symbol))
    }

    pub fn pattern_param(&self, name: BindingName) -> Parameter {
        Parameter {
            pos: 0,
            name,
            initializer: None,
            rest: false,
        }
    }

    pub fn param_with_default(&self, symbol: SourceSymbol, initializer: Expression) -> Parameter {
        Parameter {
            initializer: Some(initializer),
            ..self.param(symbol)
        }
    }

    pub fn rest_param(&self, symbol: SourceSymbol) -> Parameter {
        Parameter {
            rest: true,
            ..self.param(symbol)
        }
    }

    fn function_like(
        &self,
        kind: FunctionKind,
        name: Option<Ident>,
        parameters: Vec<Parameter>,
        body: FunctionBody,
    ) -> Box<FunctionLike> {
        Box::new(FunctionLike {
            id: self.node_id(),
            pos: 0,
            kind,
            name,
            parameters,
            body,
        })
    }

    /// `(params) => expression`
    pub fn arrow(&self, parameters: Vec<Parameter>, body: Expression) -> Expression {
        let function = self.function_like(
            FunctionKind::Arrow,
            None,
            parameters,
            FunctionBody::Expression(Box::new(body)),
        );
        self.expression(ExpressionKind::Function(function))
    }

    /// `(params) => { statements }`
    pub fn arrow_block(&self, parameters: Vec<Parameter>, statements: Vec<Statement>) -> Expression {
        let function = self.function_like(
            FunctionKind::Arrow,
            None,
            parameters,
            FunctionBody::Block(statements),
        );
        self.expression(ExpressionKind::Function(function))
    }

    pub fn function_expression(&self, parameters: Vec<Parameter>, statements: Vec<Statement>) -> Expression {
        let function = self.function_like(
            FunctionKind::Expression,
            None,
            parameters,
            FunctionBody::Block(statements),
        );
        self.expression(ExpressionKind::Function(function))
    }

    pub fn unsupported_expression(&self, kind: &str) -> Expression {
        self.expression(ExpressionKind::Unsupported {
            kind: kind.to_string(),
        })
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn statement(&self, kind: StatementKind) -> Statement {
        Statement {
            id: self.node_id(),
            pos: 0,
            kind,
        }
    }

    pub fn declaration(&self, name: BindingName, initializer: Option<Expression>) -> VariableDeclaration {
        VariableDeclaration {
            id: self.node_id(),
            pos: 0,
            name,
            initializer,
        }
    }

    pub fn variable(&self, kind: DeclarationKind, declarations: Vec<VariableDeclaration>) -> Statement {
        self.statement(StatementKind::Variable {
            list: DeclarationList {
                pos: 0,
                kind,
                declarations,
            },
            modifiers: Modifiers::default(),
            jsdoc: None,
        })
    }

    pub fn let_(&self, symbol: SourceSymbol, initializer: Option<Expression>) -> Statement {
        let declaration = self.declaration(self.binding(symbol), initializer);
        self.variable(DeclarationKind::Let, vec![declaration])
    }

    pub fn const_(&self, symbol: SourceSymbol, initializer: Expression) -> Statement {
        let declaration = self.declaration(self.binding(symbol), Some(initializer));
        self.variable(DeclarationKind::Const, vec![declaration])
    }

    pub fn var_(&self, symbol: SourceSymbol, initializer: Option<Expression>) -> Statement {
        let declaration = self.declaration(self.binding(symbol), initializer);
        self.variable(DeclarationKind::Var, vec![declaration])
    }

    /// `const <pattern> = initializer`
    pub fn destructure(&self, pattern: BindingName, initializer: Expression) -> Statement {
        let declaration = self.declaration(pattern, Some(initializer));
        self.variable(DeclarationKind::Const, vec![declaration])
    }

    pub fn function_declaration(
        &self,
        symbol: SourceSymbol,
        parameters: Vec<Parameter>,
        statements: Vec<Statement>,
    ) -> Statement {
        let name = self.ident(symbol);
        let function = self.function_like(
            FunctionKind::Declaration,
            Some(name),
            parameters,
            FunctionBody::Block(statements),
        );
        self.statement(StatementKind::Function {
            function,
            modifiers: Modifiers::default(),
            jsdoc: None,
        })
    }

    /// Add `export` to a variable or function declaration.
    pub fn exported(&self, mut statement: Statement) -> Statement {
        match &mut statement.kind {
            StatementKind::Variable { modifiers, .. } | StatementKind::Function { modifiers, .. } => {
                modifiers.export = true;
            }
            _ => {}
        }
        statement
    }

    /// Add `declare` to a variable or function declaration.
    pub fn ambient(&self, mut statement: Statement) -> Statement {
        match &mut statement.kind {
            StatementKind::Variable { modifiers, .. } | StatementKind::Function { modifiers, .. } => {
                modifiers.declare = true;
            }
            _ => {}
        }
        statement
    }

    /// Attach a documentation comment to a declaration.
    pub fn documented(&self, mut statement: Statement, text: &str) -> Statement {
        match &mut statement.kind {
            StatementKind::Variable { jsdoc, .. } | StatementKind::Function { jsdoc, .. } => {
                *jsdoc = Some(text.to_string());
            }
            _ => {}
        }
        statement
    }

    pub fn expression_statement(&self, expression: Expression) -> Statement {
        self.statement(StatementKind::Expression(expression))
    }

    pub fn ret(&self, expression: Option<Expression>) -> Statement {
        self.statement(StatementKind::Return(expression))
    }

    pub fn if_(&self, condition: Expression, then_statement: Statement, else_statement: Option<Statement>) -> Statement {
        self.statement(StatementKind::If {
            condition,
            then_statement: Box::new(then_statement),
            else_statement: else_statement.map(Box::new),
        })
    }

    pub fn block(&self, statements: Vec<Statement>) -> Statement {
        self.statement(StatementKind::Block(statements))
    }

    pub fn while_(&self, condition: Expression, body: Statement) -> Statement {
        self.statement(StatementKind::While {
            condition,
            body: Box::new(body),
        })
    }

    pub fn do_while(&self, body: Statement, condition: Expression) -> Statement {
        self.statement(StatementKind::DoWhile {
            body: Box::new(body),
            condition,
        })
    }

    pub fn for_(
        &self,
        initializer: Option<ForInitializer>,
        condition: Option<Expression>,
        incrementor: Option<Expression>,
        body: Statement,
    ) -> Statement {
        self.statement(StatementKind::For {
            initializer,
            condition,
            incrementor,
            body: Box::new(body),
        })
    }

    /// `let symbol = initializer` as a `for` initializer.
    pub fn for_let(&self, symbol: SourceSymbol, initializer: Expression) -> ForInitializer {
        ForInitializer::Declarations(DeclarationList {
            pos: 0,
            kind: DeclarationKind::Let,
            declarations: vec![self.declaration(self.binding(symbol), Some(initializer))],
        })
    }

    /// `for (const symbol of expression) body`
    pub fn for_of(&self, symbol: SourceSymbol, expression: Expression, body: Statement) -> Statement {
        let initializer = ForInitializer::Declarations(DeclarationList {
            pos: 0,
            kind: DeclarationKind::Const,
            declarations: vec![self.declaration(self.binding(symbol), None)],
        });
        self.statement(StatementKind::ForOf {
            initializer,
            expression,
            body: Box::new(body),
        })
    }

    pub fn switch(&self, expression: Expression, clauses: Vec<CaseClause>) -> Statement {
        self.statement(StatementKind::Switch { expression, clauses })
    }

    pub fn case(&self, test: Expression, statements: Vec<Statement>) -> CaseClause {
        CaseClause {
            pos: 0,
            test: Some(test),
            statements,
        }
    }

    pub fn default_clause(&self, statements: Vec<Statement>) -> CaseClause {
        CaseClause {
            pos: 0,
            test: None,
            statements,
        }
    }

    pub fn break_(&self) -> Statement {
        self.statement(StatementKind::Break)
    }

    pub fn continue_(&self) -> Statement {
        self.statement(StatementKind::Continue { label: None })
    }

    pub fn continue_label(&self, label: &str) -> Statement {
        self.statement(StatementKind::Continue {
            label: Some(label.to_string()),
        })
    }

    pub fn throw(&self, expression: Expression) -> Statement {
        self.statement(StatementKind::Throw(expression))
    }

    pub fn try_(
        &self,
        try_block: Vec<Statement>,
        catch_clause: Option<CatchClause>,
        finally_block: Option<Vec<Statement>>,
    ) -> Statement {
        self.statement(StatementKind::Try {
            try_block,
            catch_clause,
            finally_block,
        })
    }

    pub fn catch(&self, binding: Option<SourceSymbol>, block: Vec<Statement>) -> CatchClause {
        CatchClause {
            pos: 0,
            binding: binding.map(|symbol| self.binding(symbol)),
            block,
        }
    }

    /// `import { a, b as c } from "module"`; pairs are `(imported name, local symbol)`.
    pub fn import_named(&self, module: &str, specifiers: Vec<(Option<&str>, SourceSymbol)>) -> Statement {
        let specifiers = specifiers
            .into_iter()
            .map(|(property_name, symbol)| ImportSpecifier {
                pos: 0,
                property_name: property_name.map(str::to_string),
                name: self.ident(symbol),
            })
            .collect();
        self.import(
            module,
            Some(ImportClause {
                default: None,
                named: Some(NamedImports::Named(specifiers)),
            }),
        )
    }

    /// `import * as ns from "module"`
    pub fn import_namespace(&self, module: &str, symbol: SourceSymbol) -> Statement {
        let name = self.ident(symbol);
        self.import(
            module,
            Some(ImportClause {
                default: None,
                named: Some(NamedImports::Namespace(name)),
            }),
        )
    }

    pub fn import(&self, module: &str, clause: Option<ImportClause>) -> Statement {
        self.statement(StatementKind::Import {
            module_specifier: module.to_string(),
            clause,
        })
    }

    pub fn empty(&self) -> Statement {
        self.statement(StatementKind::Empty)
    }

    pub fn unsupported_statement(&self, kind: &str) -> Statement {
        self.statement(StatementKind::Unsupported {
            kind: kind.to_string(),
        })
    }

    // =========================================================================
    // Finishing
    // =========================================================================

    /// Assign positions, synthesize text and hand out the resolver answers.
    pub fn finish(self, file_name: &str, mut statements: Vec<Statement>) -> (SourceFile, SymbolTable) {
        let mut table = self.table.into_inner();
        let mut positioner = Positioner {
            text: String::new(),
            table: &mut table,
        };
        for statement in &mut statements {
            positioner.statement(statement);
        }
        let text = positioner.text;
        let is_module = statements.iter().any(|statement| match &statement.kind {
            StatementKind::Import { .. } => true,
            StatementKind::Variable { modifiers, .. } | StatementKind::Function { modifiers, .. } => {
                modifiers.export
            }
            _ => false,
        });

        let file = SourceFile {
            file_name: file_name.to_string(),
            text,
            statements,
            is_module,
        };
        (file, table)
    }
}

/// Pre-order position assignment.
struct Positioner<'t> {
    text: String,
    table: &'t mut SymbolTable,
}

impl Positioner<'_> {
    fn mark(&mut self) -> u32 {
        let pos = self.text.len() as u32;
        self.text.push('x');
        pos
    }

    fn ident(&mut self, ident: &mut Ident, declares: bool) {
        ident.pos = self.mark();
        if declares && let Some(symbol) = ident.symbol {
            self.table.declare(symbol, ident.pos);
        }
    }

    fn binding_name(&mut self, name: &mut BindingName) {
        match name {
            BindingName::Identifier(ident) => self.ident(ident, true),
            BindingName::Array(elements) => {
                for element in elements.iter_mut().flatten() {
                    self.binding_element(element);
                }
            }
            BindingName::Object(elements) => {
                for element in elements {
                    self.binding_element(element);
                }
            }
        }
    }

    fn binding_element(&mut self, element: &mut BindingElement) {
        element.pos = self.mark();
        if let Some(PropertyName::Computed(expression)) = &mut element.property_name {
            self.expression(expression);
        }
        self.binding_name(&mut element.name);
        if let Some(initializer) = &mut element.initializer {
            self.expression(initializer);
        }
    }

    fn declaration_list(&mut self, list: &mut DeclarationList) {
        list.pos = self.mark();
        for declaration in &mut list.declarations {
            declaration.pos = self.mark();
            self.binding_name(&mut declaration.name);
            if let Some(initializer) = &mut declaration.initializer {
                self.expression(initializer);
            }
        }
    }

    fn function(&mut self, function: &mut FunctionLike, declaration_pos: Option<u32>) {
        function.pos = declaration_pos.unwrap_or_else(|| self.mark());
        if let Some(name) = &mut function.name {
            self.ident(name, false);
            if let (Some(symbol), Some(pos)) = (name.symbol, declaration_pos) {
                self.table.declare(symbol, pos);
            }
        }
        for parameter in &mut function.parameters {
            parameter.pos = self.mark();
            self.binding_name(&mut parameter.name);
            if let Some(initializer) = &mut parameter.initializer {
                self.expression(initializer);
            }
        }
        match &mut function.body {
            FunctionBody::Block(statements) => self.statements(statements),
            FunctionBody::Expression(expression) => self.expression(expression),
        }
    }

    fn statements(&mut self, statements: &mut [Statement]) {
        for statement in statements {
            self.statement(statement);
        }
    }

    fn statement(&mut self, statement: &mut Statement) {
        if !self.text.is_empty() {
            self.text.push('\n');
        }
        statement.pos = self.mark();
        match &mut statement.kind {
            StatementKind::Variable { list, .. } => self.declaration_list(list),
            StatementKind::Function { function, .. } => self.function(function, Some(statement.pos)),
            StatementKind::Expression(expression) | StatementKind::Throw(expression) => {
                self.expression(expression)
            }
            StatementKind::Return(expression) => {
                if let Some(expression) = expression {
                    self.expression(expression);
                }
            }
            StatementKind::If {
                condition,
                then_statement,
                else_statement,
            } => {
                self.expression(condition);
                self.statement(then_statement);
                if let Some(else_statement) = else_statement {
                    self.statement(else_statement);
                }
            }
            StatementKind::Block(statements) => self.statements(statements),
            StatementKind::While { condition, body } => {
                self.expression(condition);
                self.statement(body);
            }
            StatementKind::DoWhile { body, condition } => {
                self.statement(body);
                self.expression(condition);
            }
            StatementKind::For {
                initializer,
                condition,
                incrementor,
                body,
            } => {
                if let Some(initializer) = initializer {
                    self.for_initializer(initializer);
                }
                if let Some(condition) = condition {
                    self.expression(condition);
                }
                if let Some(incrementor) = incrementor {
                    self.expression(incrementor);
                }
                self.statement(body);
            }
            StatementKind::ForOf {
                initializer,
                expression,
                body,
            } => {
                self.for_initializer(initializer);
                self.expression(expression);
                self.statement(body);
            }
            StatementKind::Switch { expression, clauses } => {
                self.expression(expression);
                for clause in clauses {
                    clause.pos = self.mark();
                    if let Some(test) = &mut clause.test {
                        self.expression(test);
                    }
                    self.statements(&mut clause.statements);
                }
            }
            StatementKind::Try {
                try_block,
                catch_clause,
                finally_block,
            } => {
                self.statements(try_block);
                if let Some(clause) = catch_clause {
                    clause.pos = self.mark();
                    if let Some(binding) = &mut clause.binding {
                        self.binding_name(binding);
                    }
                    self.statements(&mut clause.block);
                }
                if let Some(finally_block) = finally_block {
                    self.statements(finally_block);
                }
            }
            StatementKind::Import { clause, .. } => {
                if let Some(clause) = clause {
                    if let Some(default) = &mut clause.default {
                        self.ident(default, true);
                    }
                    match &mut clause.named {
                        Some(NamedImports::Namespace(name)) => self.ident(name, true),
                        Some(NamedImports::Named(specifiers)) => {
                            for specifier in specifiers {
                                specifier.pos = self.mark();
                                self.ident(&mut specifier.name, true);
                            }
                        }
                        None => {}
                    }
                }
            }
            StatementKind::Break
            | StatementKind::Continue { .. }
            | StatementKind::Empty
            | StatementKind::Unsupported { .. } => {}
        }
    }

    fn for_initializer(&mut self, initializer: &mut ForInitializer) {
        match initializer {
            ForInitializer::Declarations(list) => self.declaration_list(list),
            ForInitializer::Expression(expression) => self.expression(expression),
        }
    }

    fn expression(&mut self, expression: &mut Expression) {
        expression.pos = self.mark();
        match &mut expression.kind {
            ExpressionKind::Identifier(ident) => ident.pos = expression.pos,
            ExpressionKind::This
            | ExpressionKind::Null
            | ExpressionKind::Undefined
            | ExpressionKind::True
            | ExpressionKind::False
            | ExpressionKind::Numeric(_)
            | ExpressionKind::String(_)
            | ExpressionKind::OptionalContinuation
            | ExpressionKind::Unsupported { .. } => {}
            ExpressionKind::Template { spans, .. } => {
                for span in spans {
                    self.expression(&mut span.expression);
                }
            }
            ExpressionKind::Array(elements) => {
                for element in elements {
                    self.expression(element);
                }
            }
            ExpressionKind::Object(members) => {
                for member in members {
                    match member {
                        ObjectMember::Property { name, value } => {
                            if let PropertyName::Computed(key) = name {
                                self.expression(key);
                            }
                            self.expression(value);
                        }
                        ObjectMember::Shorthand(ident) => self.ident(ident, false),
                        ObjectMember::Spread(value) => self.expression(value),
                    }
                }
            }
            ExpressionKind::Spread(inner) | ExpressionKind::Parenthesized(inner) => self.expression(inner),
            ExpressionKind::PropertyAccess { expression: object, .. } => self.expression(object),
            ExpressionKind::ElementAccess {
                expression: object,
                argument,
            } => {
                self.expression(object);
                self.expression(argument);
            }
            ExpressionKind::Call { callee, arguments } => {
                self.expression(callee);
                for argument in arguments {
                    self.expression(argument);
                }
            }
            ExpressionKind::Prefix { operand, .. } | ExpressionKind::Postfix { operand, .. } => {
                self.expression(operand)
            }
            ExpressionKind::Binary { left, right, .. } => {
                self.expression(left);
                self.expression(right);
            }
            ExpressionKind::Conditional {
                condition,
                when_true,
                when_false,
            } => {
                self.expression(condition);
                self.expression(when_true);
                self.expression(when_false);
            }
            ExpressionKind::Function(function) => self.function(function, None),
            ExpressionKind::OptionalChain {
                expression: object,
                continuation,
            } => {
                self.expression(object);
                self.expression(continuation);
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/builder.rs"]
mod tests;
