//! Lexically scoped symbol environments.
//!
//! A scope is a chain of hash maps: `Environment::child` creates a fresh,
//! empty map whose lookups fall back to its parent on a miss. The const
//! root (builtins plus top-level `const` declarations) sits at the bottom
//! of every chain; ordinary `var`/`const`/`func` declarations hang scopes
//! off it as blocks and function calls are entered, mirroring the
//! `EvalContext` chain this module is based on.

use std::collections::HashMap;
use std::rc::Rc;

use crate::value::lvalue::{new_lvalue, LValueHandle};
use crate::value::Value;

struct ScopeData {
    parent: Option<Environment>,
    symbols: std::cell::RefCell<HashMap<String, LValueHandle>>,
}

/// A reference-counted handle to one scope in the chain. Cheap to clone;
/// clones share the same underlying symbol table (this is how a function's
/// snapshot of "the global scope" stays live after the call that declared
/// it returns).
#[derive(Clone)]
pub struct Environment(Rc<ScopeData>);

impl Environment {
    /// A scope with no parent: used only for the const root.
    pub fn root() -> Self {
        Environment(Rc::new(ScopeData {
            parent: None,
            symbols: std::cell::RefCell::new(HashMap::new()),
        }))
    }

    pub fn child(parent: &Environment) -> Self {
        Environment(Rc::new(ScopeData {
            parent: Some(parent.clone()),
            symbols: std::cell::RefCell::new(HashMap::new()),
        }))
    }

    /// Declares `name` in *this* scope only, returning `false` if it's
    /// already bound here (the caller is responsible for turning that into
    /// an `already-defined` error; shadowing an enclosing scope is legal).
    pub fn declare(&self, name: &str, value: Value, is_const: bool) -> bool {
        let mut symbols = self.0.symbols.borrow_mut();
        if symbols.contains_key(name) {
            return false;
        }
        symbols.insert(name.to_string(), new_lvalue(value, is_const));
        true
    }

    pub fn declare_cell(&self, name: &str, cell: LValueHandle) -> bool {
        let mut symbols = self.0.symbols.borrow_mut();
        if symbols.contains_key(name) {
            return false;
        }
        symbols.insert(name.to_string(), cell);
        true
    }

    pub fn is_bound_here(&self, name: &str) -> bool {
        self.0.symbols.borrow().contains_key(name)
    }

    /// Walks the scope chain looking for `name`, returning the L-value cell
    /// it's bound to, if any.
    pub fn lookup(&self, name: &str) -> Option<LValueHandle> {
        let mut scope = self;
        let owned;
        loop {
            if let Some(cell) = scope.0.symbols.borrow().get(name) {
                return Some(cell.clone());
            }
            match &scope.0.parent {
                Some(parent) => {
                    owned = parent.clone();
                    scope = &owned;
                }
                None => return None,
            }
        }
    }

    /// Whether `name` is bound as `const` anywhere in the chain (used to
    /// reject shadowing a const from an enclosing scope, per the parser's
    /// declaration rules).
    pub fn is_const_anywhere(&self, name: &str) -> bool {
        self.lookup(name)
            .is_some_and(|cell| cell.borrow().is_const)
    }

    /// Walks to the top of the scope chain (the const root with no parent).
    /// Used by the evaluator to recover the const-only environment a `pure`
    /// function's capture root is restricted to, given only the program's
    /// outermost ordinary scope.
    pub fn root_ancestor(&self) -> Environment {
        let mut cur = self.clone();
        loop {
            let parent = cur.0.parent.clone();
            match parent {
                Some(p) => cur = p,
                None => return cur,
            }
        }
    }
}
