//! # Symbol Table Module
//!
//! Name-to-slot resolution for the single global scope. Each defined name
//! receives the next slot index from a monotonically increasing counter;
//! redefining a name rebinds it to a fresh slot and abandons the old one.

use rustc_hash::FxHashMap;

/// The scope a symbol was defined in. Minnow has no nested scopes, so
/// `Global` is the only variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolScope {
    Global,
}

/// A resolved name: where it lives and which slot it occupies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub scope: SymbolScope,
    pub index: usize,
}

/// Maps names to symbols during compilation.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    store: FxHashMap<String, Symbol>,
    num_definitions: usize,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines `name` at the next free global slot, overwriting any prior
    /// binding. The definition counter never decreases, so a shadowed
    /// binding's slot stays reserved.
    pub fn define(&mut self, name: &str) -> Symbol {
        let symbol = Symbol {
            name: name.to_string(),
            scope: SymbolScope::Global,
            index: self.num_definitions,
        };
        self.store.insert(name.to_string(), symbol.clone());
        self.num_definitions += 1;
        symbol
    }

    /// Looks up `name`, returning the current binding if any.
    pub fn resolve(&self, name: &str) -> Option<&Symbol> {
        self.store.get(name)
    }
}
