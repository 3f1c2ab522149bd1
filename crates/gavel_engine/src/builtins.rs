//! The built-in registry.
//!
//! An expression of the form `[op, a, b, ...]` dispatches to the
//! registered function named by `op`. The evaluator ships with the
//! equality operator `=`; hosts register additional operators before
//! building contexts. Operator validity is a compile-time guarantee, so
//! the evaluator panics on names missing from the registry.

use std::collections::HashMap;

use gavel_foundation::Result;

use crate::context::Ctx;
use crate::unify::eval_eq;

/// The distinguished equality operator.
pub const EQUALITY: &str = "=";

/// A built-in: receives the context, the plugged expression, and the
/// success continuation.
pub type BuiltinFn = for<'s> fn(
    &Ctx<'s>,
    &gavel_foundation::Expr,
    &mut dyn FnMut(&Ctx<'s>) -> Result<()>,
) -> Result<()>;

/// Registry of built-in functions, keyed by operator name.
pub struct Builtins {
    map: HashMap<String, BuiltinFn>,
}

impl Builtins {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Registers a built-in under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, builtin: BuiltinFn) {
        self.map.insert(name.into(), builtin);
    }

    /// Looks up a built-in by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BuiltinFn> {
        self.map.get(name)
    }

    /// Returns the number of registered built-ins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns true if no built-ins are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Default for Builtins {
    /// The standard registry: equality only.
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register(EQUALITY, eval_eq);
        registry
    }
}
