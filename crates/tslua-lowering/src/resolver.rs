//! Read-only oracle over the front end's binder and checker.
//!
//! Lowering never inspects types itself; every semantic question goes through
//! [`Resolver`]. [`SymbolTable`] is the plain-data implementation produced by
//! [`SourceBuilder`](crate::builder::SourceBuilder) and usable by any front end
//! that can precompute its answers.

use crate::source::{NodeId, SourceSymbol};
use bitflags::bitflags;
use rustc_hash::FxHashMap;

bitflags! {
    /// What the checker knows about the type of an expression.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TypeFacts: u8 {
        const STRING = 1 << 0;
        const NUMBER = 1 << 1;
        const BOOLEAN = 1 << 2;
        const ARRAY = 1 << 3;
        /// `any`, `unknown` or a type parameter.
        const UNKNOWN = 1 << 4;
    }
}

impl TypeFacts {
    /// Types admitting a falsy value other than `null`/`undefined`
    /// (`false`, or anything when the type is not known).
    ///
    /// `0` and `""` are truthy in Lua, so only booleans matter.
    pub fn can_be_falsy_when_not_null(self) -> bool {
        self.intersects(TypeFacts::BOOLEAN | TypeFacts::UNKNOWN)
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SymbolFlags: u8 {
        /// `const` bindings and imports: never reassigned after declaration.
        const CONST = 1 << 0;
        const EXPORTED = 1 << 1;
        /// Import binding the checker found unreferenced (type-only use).
        const UNUSED_ALIAS = 1 << 2;
    }
}

/// Calling convention of a function or call target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContextType {
    /// `this: void`; no implicit first parameter.
    #[default]
    Void,
    /// Functions receive `self` as their first parameter.
    NonVoid,
}

pub trait Resolver {
    /// Offset of the first declaration of `symbol` in the current file.
    fn declaration_position(&self, symbol: SourceSymbol) -> Option<u32>;

    fn is_const(&self, symbol: SourceSymbol) -> bool;

    fn is_exported(&self, symbol: SourceSymbol) -> bool;

    /// Whether an import binding is used as a value.
    fn is_referenced_alias(&self, _symbol: SourceSymbol) -> bool {
        true
    }

    fn type_facts(&self, node: NodeId) -> TypeFacts;

    /// Convention of a function node, or of the target of a call's callee node.
    fn context_type(&self, node: NodeId) -> ContextType;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolEntry {
    pub name: String,
    pub flags: SymbolFlags,
    pub declaration_position: Option<u32>,
}

/// Precomputed resolver answers.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: Vec<SymbolEntry>,
    type_facts: FxHashMap<NodeId, TypeFacts>,
    context_types: FxHashMap<NodeId, ContextType>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    pub fn add_symbol(&mut self, name: impl Into<String>, flags: SymbolFlags) -> SourceSymbol {
        let symbol = SourceSymbol(self.symbols.len() as u32);
        self.symbols.push(SymbolEntry {
            name: name.into(),
            flags,
            declaration_position: None,
        });
        symbol
    }

    pub fn symbol(&self, symbol: SourceSymbol) -> Option<&SymbolEntry> {
        self.symbols.get(symbol.0 as usize)
    }

    /// Record a declaration site; only the first one is kept.
    pub fn declare(&mut self, symbol: SourceSymbol, pos: u32) {
        if let Some(entry) = self.symbols.get_mut(symbol.0 as usize)
            && entry.declaration_position.is_none()
        {
            entry.declaration_position = Some(pos);
        }
    }

    pub fn set_type_facts(&mut self, node: NodeId, facts: TypeFacts) {
        self.type_facts.insert(node, facts);
    }

    pub fn set_context_type(&mut self, node: NodeId, context_type: ContextType) {
        self.context_types.insert(node, context_type);
    }

    fn flags(&self, symbol: SourceSymbol) -> SymbolFlags {
        self.symbol(symbol).map_or(SymbolFlags::empty(), |entry| entry.flags)
    }
}

impl Resolver for SymbolTable {
    fn declaration_position(&self, symbol: SourceSymbol) -> Option<u32> {
        self.symbol(symbol).and_then(|entry| entry.declaration_position)
    }

    fn is_const(&self, symbol: SourceSymbol) -> bool {
        self.flags(symbol).contains(SymbolFlags::CONST)
    }

    fn is_exported(&self, symbol: SourceSymbol) -> bool {
        self.flags(symbol).contains(SymbolFlags::EXPORTED)
    }

    fn is_referenced_alias(&self, symbol: SourceSymbol) -> bool {
        !self.flags(symbol).contains(SymbolFlags::UNUSED_ALIAS)
    }

    fn type_facts(&self, node: NodeId) -> TypeFacts {
        self.type_facts.get(&node).copied().unwrap_or_default()
    }

    fn context_type(&self, node: NodeId) -> ContextType {
        self.context_types.get(&node).copied().unwrap_or_default()
    }
}
