//! Shared helpers for engine integration tests.

use gavel_engine::{evaluate, Ctx};
use gavel_foundation::{Bindings, Body, Ref, Term, Value, Var};
use gavel_storage::DataStore;
use serde_json::json;

/// Builds a reference term `head.sel0.sel1...`.
pub fn r(head: &str, selectors: Vec<Term>) -> Term {
    let mut terms = vec![Term::var(head)];
    terms.extend(selectors);
    Term::reference(Ref::new(terms))
}

/// Shorthand for a variable key in bindings lookups.
pub fn v(name: &str) -> Value {
    Value::Var(Var::new(name))
}

/// The store from the base-document scenarios:
/// `{"a":[{"b":{"c":[true,2,false]}},{"b":{"c":[false,true,1]}}]}` under
/// the root `data`.
pub fn scenario_store() -> DataStore {
    let mut store = DataStore::new();
    store
        .insert(
            &["data"],
            json!({
                "a": [
                    {"b": {"c": [true, 2, false]}},
                    {"b": {"c": [false, true, 1]}}
                ]
            }),
        )
        .unwrap();
    store
}

/// Runs a body and collects the emitted binding environments in order.
pub fn solve(store: &DataStore, body: Body) -> Vec<Bindings> {
    solve_with(store, body, true)
}

/// Runs a body with the indexed fast path on or off.
pub fn solve_with(store: &DataStore, body: Body, indexing: bool) -> Vec<Bindings> {
    let ctx = Ctx::new(body, store).with_indexing(indexing);
    let mut out = Vec::new();
    evaluate(&ctx, &mut |c| {
        out.push(c.bindings.clone());
        Ok(())
    })
    .unwrap();
    out
}
