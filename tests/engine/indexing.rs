//! The indexed equality fast path.

use gavel_foundation::{Body, Expr, Rule, Term, Value};
use gavel_storage::DataStore;
use serde_json::json;

use crate::helpers::{r, scenario_store, solve_with, v};

fn lookup_body() -> Body {
    Body::new(vec![Expr::equality(
        r(
            "data",
            vec![
                Term::string("a"),
                Term::var("i"),
                Term::string("b"),
                Term::string("c"),
                Term::var("j"),
            ],
        ),
        Term::int(2),
    )])
}

#[test]
fn indexed_lookup_builds_an_index() {
    let store = scenario_store();
    assert_eq!(store.index_count(), 0);

    let solutions = solve_with(&store, lookup_body(), true);
    assert_eq!(solutions.len(), 1);
    assert_eq!(store.index_count(), 1);
}

#[test]
fn plain_enumeration_builds_no_index() {
    let store = scenario_store();
    let solutions = solve_with(&store, lookup_body(), false);
    assert_eq!(solutions.len(), 1);
    assert_eq!(store.index_count(), 0);
}

#[test]
fn index_equivalence() {
    // Indexed and enumerated evaluation emit the same sequence.
    let indexed_store = scenario_store();
    let plain_store = scenario_store();

    let indexed = solve_with(&indexed_store, lookup_body(), true);
    let plain = solve_with(&plain_store, lookup_body(), false);

    assert_eq!(indexed.len(), plain.len());
    for (a, b) in indexed.iter().zip(plain.iter()) {
        assert_eq!(a.get(&v("i")), b.get(&v("i")));
        assert_eq!(a.get(&v("j")), b.get(&v("j")));
    }
}

#[test]
fn unbound_other_side_disables_indexing() {
    // data.a[i].b.c[j] = x with x free needs full enumeration.
    let store = scenario_store();
    let body = Body::new(vec![Expr::equality(
        r(
            "data",
            vec![
                Term::string("a"),
                Term::var("i"),
                Term::string("b"),
                Term::string("c"),
                Term::var("j"),
            ],
        ),
        Term::var("x"),
    )]);

    let solutions = solve_with(&store, body, true);
    assert_eq!(solutions.len(), 6);
    assert_eq!(store.index_count(), 0);
}

#[test]
fn virtual_references_are_not_indexed() {
    let mut store = DataStore::new();
    store.install_rules(
        "p",
        vec![Rule::partial_set(
            "p",
            Term::int(1),
            Body::new(vec![Expr::term(Term::boolean(true))]),
        )],
    );

    let body = Body::new(vec![Expr::equality(
        r("p", vec![Term::var("x")]),
        Term::boolean(true),
    )]);
    let solutions = solve_with(&store, body, true);
    assert_eq!(solutions.len(), 1);
    assert_eq!(store.index_count(), 0);
}

#[test]
fn missing_base_path_falls_back_silently() {
    let store = scenario_store();
    let body = Body::new(vec![Expr::equality(
        r("data", vec![Term::string("missing"), Term::var("i")]),
        Term::int(1),
    )]);

    let solutions = solve_with(&store, body, true);
    assert!(solutions.is_empty());
    assert_eq!(store.index_count(), 0);
}

#[test]
fn two_reference_equality_uses_index() {
    // data.m[i] = data.n[j]: one side indexed, the other enumerated.
    let mut store = DataStore::new();
    store
        .insert(&["data"], json!({"m": [1, 2, 3], "n": [3, 4]}))
        .unwrap();

    let body = Body::new(vec![Expr::equality(
        r("data", vec![Term::string("m"), Term::var("i")]),
        r("data", vec![Term::string("n"), Term::var("j")]),
    )]);

    let indexed = solve_with(&store, body.clone(), true);
    assert_eq!(indexed.len(), 1);
    assert_eq!(indexed[0].get(&v("i")), Some(&Value::Int(2)));
    assert_eq!(indexed[0].get(&v("j")), Some(&Value::Int(0)));
    assert!(store.index_count() >= 1);

    let plain_store = {
        let mut s = DataStore::new();
        s.insert(&["data"], json!({"m": [1, 2, 3], "n": [3, 4]}))
            .unwrap();
        s
    };
    let plain = solve_with(&plain_store, body, false);
    assert_eq!(plain.len(), 1);
    assert_eq!(plain[0].get(&v("i")), indexed[0].get(&v("i")));
    assert_eq!(plain[0].get(&v("j")), indexed[0].get(&v("j")));
}

#[test]
fn writes_invalidate_and_results_follow() {
    let mut store = scenario_store();

    let before = solve_with(&store, lookup_body(), true);
    assert_eq!(before.len(), 1);
    assert_eq!(store.index_count(), 1);

    // Rewrite the subtree: the index is discarded and rebuilt lazily.
    store
        .insert(&["data"], json!({"a": [{"b": {"c": [2, 2]}}]}))
        .unwrap();
    assert_eq!(store.index_count(), 0);

    let after = solve_with(&store, lookup_body(), true);
    assert_eq!(after.len(), 2);
    assert_eq!(store.index_count(), 1);
}
