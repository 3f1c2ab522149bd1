//! The evaluation context.
//!
//! A context bundles the query body, the binding environment, the
//! current expression index, and the handles the evaluator needs.
//! Contexts are immutable per step: `step`, `child`, and the binding
//! operations all return derived contexts, so a failed branch needs no
//! undo. Copies are cheap because the environment is persistent.

use std::rc::Rc;
use std::sync::Arc;

use gavel_foundation::{Bindings, Body, Expr, Ref, Rule, Value, Var};
use gavel_storage::DataStore;

use crate::builtins::Builtins;
use crate::plug::plug_value;
use crate::trace::{TraceEvent, TraceOp, TracerHandle};

/// The state of one step of the proof search.
#[derive(Clone)]
pub struct Ctx<'s> {
    /// The body being evaluated.
    pub query: Arc<Body>,
    /// The binding environment.
    pub bindings: Bindings,
    /// Index of the current expression in `query`.
    pub index: usize,
    /// Rule dereference nesting depth.
    pub depth: usize,
    /// The context this one was derived from, for tracing.
    pub previous: Option<Rc<Ctx<'s>>>,
    /// The store holding base and virtual documents.
    pub store: &'s DataStore,
    /// The built-in registry.
    pub builtins: Rc<Builtins>,
    /// Optional tracing hook.
    pub tracer: Option<TracerHandle>,
    /// Whether the indexed equality fast path may be used.
    pub indexing: bool,
}

impl<'s> Ctx<'s> {
    /// Creates a context for a query body with no bindings.
    #[must_use]
    pub fn new(query: Body, store: &'s DataStore) -> Self {
        Self {
            query: Arc::new(query),
            bindings: Bindings::new(),
            index: 0,
            depth: 0,
            previous: None,
            store,
            builtins: Rc::new(Builtins::default()),
            tracer: None,
            indexing: true,
        }
    }

    /// Attaches a tracer.
    #[must_use]
    pub fn with_tracer(mut self, tracer: TracerHandle) -> Self {
        self.tracer = Some(tracer);
        self
    }

    /// Replaces the built-in registry.
    #[must_use]
    pub fn with_builtins(mut self, builtins: Rc<Builtins>) -> Self {
        self.builtins = builtins;
        self
    }

    /// Enables or disables the indexed equality fast path.
    #[must_use]
    pub fn with_indexing(mut self, indexing: bool) -> Self {
        self.indexing = indexing;
        self
    }

    /// Returns the current expression.
    ///
    /// # Panics
    /// Panics if the index is past the end of the body; callers check
    /// completion first.
    #[must_use]
    pub fn current(&self) -> &Expr {
        self.query.get(self.index).expect("index within body")
    }

    /// Returns a new context positioned at the next expression.
    #[must_use]
    pub fn step(&self) -> Self {
        let mut next = self.clone();
        next.index += 1;
        next
    }

    /// Returns a child context for evaluating a referenced rule's body.
    #[must_use]
    pub fn child(&self, rule: &Rule, bindings: Bindings) -> Self {
        let mut next = self.clone();
        next.query = Arc::new(rule.body().clone());
        next.bindings = bindings;
        next.index = 0;
        next.depth = self.depth + 1;
        next.previous = Some(Rc::new(self.clone()));
        next
    }

    /// Returns a new context with the given bindings.
    #[must_use]
    pub fn with_bindings(&self, bindings: Bindings) -> Self {
        let mut next = self.clone();
        next.bindings = bindings;
        next
    }

    /// Returns a new context binding `var` to `value`.
    ///
    /// Binding a variable to itself is a no-op. If `value` contains
    /// `var`, the binding would be recursive and `None` is returned;
    /// the branch is undefined.
    ///
    /// Existing bindings are re-plugged under the new binding so lookups
    /// stay flat.
    #[must_use]
    pub fn bind_var(&self, var: &Var, value: &Value) -> Option<Self> {
        if let Value::Var(other) = value {
            if other == var {
                return Some(self.clone());
            }
        }
        if value.contains_var(var) {
            return None;
        }

        let delta = Bindings::new().put(Value::Var(var.clone()), value.clone());
        let mut flattened = Bindings::new();
        for (k, bound) in self.bindings.iter() {
            flattened = flattened.put(k.clone(), plug_value(bound, &delta));
        }
        flattened = flattened.put(Value::Var(var.clone()), value.clone());
        Some(self.with_bindings(flattened))
    }

    /// Returns a new context binding the whole reference to `value`.
    #[must_use]
    pub fn bind_ref(&self, reference: &Ref, value: Value) -> Self {
        self.with_bindings(
            self.bindings
                .put(Value::Ref(reference.clone()), value),
        )
    }

    /// Returns true if every bound value is ground.
    #[must_use]
    pub fn bindings_ground(&self) -> bool {
        self.bindings.iter().all(|(_, v)| v.is_ground())
    }

    /// Emits a trace event if a tracer is attached and enabled.
    pub(crate) fn trace(&self, op: TraceOp, expr: Option<&Expr>) {
        let Some(tracer) = &self.tracer else { return };
        if !tracer.borrow().enabled() {
            return;
        }
        let event = TraceEvent {
            op,
            expr: expr.cloned(),
            bindings: self.bindings.clone(),
            depth: self.depth,
            parent_depth: self.previous.as_ref().map(|p| p.depth),
        };
        tracer.borrow_mut().trace(event);
    }
}
