//! Rule dereference and the query entry point.

use std::rc::Rc;

use gavel_engine::{
    compare, evaluate, top_down_query, value_to_json, Builtins, Ctx, QueryParams, QueryResult,
};
use gavel_foundation::{Body, Error, Expr, ExprTerms, Result, Rule, Term, Value};
use gavel_storage::DataStore;
use serde_json::json;

use crate::helpers::{r, solve, v};

/// The default registry plus a `gt` comparison, the way a host would
/// extend the evaluator.
pub fn registry_with_gt() -> Builtins {
    fn gt<'s>(
        ctx: &Ctx<'s>,
        expr: &gavel_foundation::Expr,
        iter: &mut dyn FnMut(&Ctx<'s>) -> Result<()>,
    ) -> Result<()> {
        let ExprTerms::Call(ts) = &expr.terms else {
            return Err(Error::internal("gt requires operands"));
        };
        let a = value_to_json(&ts[1].value, ctx.store)?;
        let b = value_to_json(&ts[2].value, ctx.store)?;
        if compare(&a, &b) == std::cmp::Ordering::Greater {
            iter(ctx)
        } else {
            Ok(())
        }
    }

    let mut registry = Builtins::default();
    registry.register("gt", gt);
    registry
}

fn truth() -> Body {
    Body::new(vec![Expr::term(Term::boolean(true))])
}

#[test]
fn complete_rule_materializes_value() {
    let mut store = DataStore::new();
    store.install_rules(
        "pi",
        vec![Rule::complete("pi", Term::float(3.14), truth())],
    );

    let result = top_down_query(&QueryParams::new(&store, vec!["pi".into()])).unwrap();
    assert_eq!(result, QueryResult::Value(json!(3.14)));
}

#[test]
fn complete_rule_with_failing_body_is_undefined() {
    let mut store = DataStore::new();
    store.install_rules(
        "p",
        vec![Rule::complete(
            "p",
            Term::boolean(true),
            Body::new(vec![Expr::equality(Term::int(1), Term::int(2))]),
        )],
    );

    let result = top_down_query(&QueryParams::new(&store, vec!["p".into()])).unwrap();
    assert!(result.is_undefined());
}

#[test]
fn complete_rule_value_is_plugged_from_body() {
    // p = x :- x = 42.
    let mut store = DataStore::new();
    store.install_rules(
        "p",
        vec![Rule::complete(
            "p",
            Term::var("x"),
            Body::new(vec![Expr::equality(Term::var("x"), Term::int(42))]),
        )],
    );

    let result = top_down_query(&QueryParams::new(&store, vec!["p".into()])).unwrap();
    assert_eq!(result, QueryResult::Value(json!(42)));
}

#[test]
fn multiple_complete_rules_conflict() {
    let mut store = DataStore::new();
    store.install_rules(
        "p",
        vec![
            Rule::complete("p", Term::int(1), truth()),
            Rule::complete("p", Term::int(2), truth()),
        ],
    );

    let err = top_down_query(&QueryParams::new(&store, vec!["p".into()])).unwrap_err();
    assert!(matches!(
        err.kind,
        gavel_foundation::ErrorKind::ConflictingRules(_)
    ));
}

#[test]
fn complete_rule_dereferences_into_composite_value() {
    // sites = {"prod": ["a", "b"]} :- true, then sites.prod[1] = x.
    let mut store = DataStore::new();
    let value = Term::object(vec![(
        Term::string("prod"),
        Term::array(vec![Term::string("a"), Term::string("b")]),
    )]);
    store.install_rules("sites", vec![Rule::complete("sites", value, truth())]);

    let body = Body::new(vec![Expr::equality(
        r("sites", vec![Term::string("prod"), Term::int(1)]),
        Term::var("x"),
    )]);
    let solutions = solve(&store, body);
    assert_eq!(solutions.len(), 1);
    assert_eq!(solutions[0].get(&v("x")), Some(&Value::from("b")));
}

#[test]
fn complete_rule_enumerates_with_variable_selectors() {
    let mut store = DataStore::new();
    let value = Term::object(vec![(
        Term::string("prod"),
        Term::array(vec![Term::string("a"), Term::string("b")]),
    )]);
    store.install_rules("sites", vec![Rule::complete("sites", value, truth())]);

    let body = Body::new(vec![Expr::equality(
        r("sites", vec![Term::var("env"), Term::var("i")]),
        Term::var("x"),
    )]);
    let solutions = solve(&store, body);
    assert_eq!(solutions.len(), 2);
    assert_eq!(solutions[0].get(&v("env")), Some(&Value::from("prod")));
    assert_eq!(solutions[0].get(&v("i")), Some(&Value::Int(0)));
    assert_eq!(solutions[1].get(&v("x")), Some(&Value::from("b")));
}

#[test]
fn partial_object_projects_key_value_pairs() {
    // p[k] = v :- data.m[k] = v, materialized as an object.
    let mut store = DataStore::new();
    store
        .insert(&["data"], json!({"m": {"k1": 1, "k2": 2}}))
        .unwrap();
    store.install_rules(
        "p",
        vec![Rule::partial_object(
            "p",
            Term::var("k"),
            Term::var("val"),
            Body::new(vec![Expr::equality(
                r("data", vec![Term::string("m"), Term::var("k")]),
                Term::var("val"),
            )]),
        )],
    );

    let result = top_down_query(&QueryParams::new(&store, vec!["p".into()])).unwrap();
    assert_eq!(result, QueryResult::Value(json!({"k1": 1, "k2": 2})));
}

#[test]
fn partial_object_rules_accumulate() {
    let mut store = DataStore::new();
    store.install_rules(
        "p",
        vec![
            Rule::partial_object("p", Term::string("a"), Term::int(1), truth()),
            Rule::partial_object("p", Term::string("b"), Term::int(2), truth()),
        ],
    );

    let result = top_down_query(&QueryParams::new(&store, vec!["p".into()])).unwrap();
    assert_eq!(result, QueryResult::Value(json!({"a": 1, "b": 2})));
}

#[test]
fn partial_object_non_string_keys_are_errors() {
    let mut store = DataStore::new();
    store.install_rules(
        "p",
        vec![Rule::partial_object("p", Term::int(1), Term::int(2), truth())],
    );

    let err = top_down_query(&QueryParams::new(&store, vec!["p".into()])).unwrap_err();
    assert!(matches!(
        err.kind,
        gavel_foundation::ErrorKind::NonStringKey(_)
    ));
}

#[test]
fn partial_object_ground_key_lookup() {
    let mut store = DataStore::new();
    store
        .insert(&["data"], json!({"m": {"k1": 1, "k2": 2}}))
        .unwrap();
    store.install_rules(
        "p",
        vec![Rule::partial_object(
            "p",
            Term::var("k"),
            Term::var("val"),
            Body::new(vec![Expr::equality(
                r("data", vec![Term::string("m"), Term::var("k")]),
                Term::var("val"),
            )]),
        )],
    );

    // p.k2 = x binds the key before running the rule body.
    let body = Body::new(vec![Expr::equality(
        r("p", vec![Term::string("k2")]),
        Term::var("x"),
    )]);
    let solutions = solve(&store, body);
    assert_eq!(solutions.len(), 1);
    let x = solutions[0].get(&v("x")).unwrap();
    assert_eq!(value_to_json(x, &store).unwrap(), json!(2));

    // A key no grounding produces is silent.
    let body = Body::new(vec![Expr::equality(
        r("p", vec![Term::string("zzz")]),
        Term::var("x"),
    )]);
    assert!(solve(&store, body).is_empty());
}

#[test]
fn partial_set_deep_dereference_is_undefined() {
    let mut store = DataStore::new();
    store.install_rules(
        "p",
        vec![Rule::partial_set("p", Term::int(1), truth())],
    );

    // p[1][0] reaches through a set element; silently no results.
    let body = Body::new(vec![Expr::term(r(
        "p",
        vec![Term::int(1), Term::int(0)],
    ))]);
    assert!(solve(&store, body).is_empty());
}

#[test]
fn partial_set_distinct_elements() {
    // Two rules contributing the same element yield one entry.
    let mut store = DataStore::new();
    store.install_rules(
        "p",
        vec![
            Rule::partial_set("p", Term::int(7), truth()),
            Rule::partial_set("p", Term::int(7), truth()),
        ],
    );

    let result = top_down_query(&QueryParams::new(&store, vec!["p".into()])).unwrap();
    assert_eq!(result, QueryResult::Value(json!([7])));
}

#[test]
fn empty_rule_set_is_undefined() {
    let mut store = DataStore::new();
    store.install_rules("p", Vec::new());
    let result = top_down_query(&QueryParams::new(&store, vec!["p".into()])).unwrap();
    assert!(result.is_undefined());
}

#[test]
fn base_document_query_returns_data() {
    let mut store = DataStore::new();
    store.insert(&["data"], json!({"a": [1, 2]})).unwrap();
    let result =
        top_down_query(&QueryParams::new(&store, vec!["data".into(), "a".into()])).unwrap();
    assert_eq!(result, QueryResult::Value(json!([1, 2])));
}

#[test]
fn missing_path_is_undefined() {
    let store = DataStore::new();
    let result = top_down_query(&QueryParams::new(&store, vec!["nope".into()])).unwrap();
    assert!(result.is_undefined());
}

#[test]
fn host_builtin_sees_plugged_operands() {
    // gt(data.n, 3) with data.n = 5.
    let mut store = DataStore::new();
    store.insert(&["data"], json!({"n": 5})).unwrap();

    let body = Body::new(vec![Expr::call(
        "gt",
        vec![r("data", vec![Term::string("n")]), Term::int(3)],
    )]);
    let ctx = Ctx::new(body, &store).with_builtins(Rc::new(registry_with_gt()));
    let mut emissions = 0;
    evaluate(&ctx, &mut |_| {
        emissions += 1;
        Ok(())
    })
    .unwrap();
    assert_eq!(emissions, 1);
}
