//! Store lookup semantics.

use gavel_foundation::{Body, Expr, Ref, Rule, Term};
use gavel_storage::{ref_to_path, DataStore, Document, PathSeg};
use serde_json::json;

fn field(name: &str) -> PathSeg {
    PathSeg::Field(name.into())
}

#[test]
fn deep_paths_resolve() {
    let mut store = DataStore::new();
    store
        .insert(&["data"], json!({"a": {"b": [null, {"c": false}]}}))
        .unwrap();

    let path = vec![
        field("data"),
        field("a"),
        field("b"),
        PathSeg::Item(1),
        field("c"),
    ];
    let Document::Data(found) = store.get(&path).unwrap() else {
        panic!("expected data");
    };
    assert_eq!(found, &json!(false));
}

#[test]
fn inserts_create_intermediate_objects() {
    let mut store = DataStore::new();
    store.insert(&["data", "a", "b"], json!(1)).unwrap();

    let Document::Data(found) = store.get(&[field("data"), field("a")]).unwrap() else {
        panic!("expected data");
    };
    assert_eq!(found, &json!({"b": 1}));
}

#[test]
fn inserts_cannot_cross_scalars() {
    let mut store = DataStore::new();
    store.insert(&["data", "a"], json!(1)).unwrap();
    assert!(store.insert(&["data", "a", "b"], json!(2)).is_err());
}

#[test]
fn ref_to_path_handles_mixed_selectors() {
    let r = Ref::new(vec![
        Term::var("data"),
        Term::string("a"),
        Term::int(1),
        Term::string("b"),
    ]);
    let path = ref_to_path(&r).unwrap();
    assert_eq!(
        path,
        vec![field("data"), field("a"), PathSeg::Item(1), field("b")]
    );
}

#[test]
fn non_ground_refs_have_no_path() {
    let r = Ref::new(vec![Term::var("data"), Term::var("i")]);
    assert!(ref_to_path(&r).is_err());
}

#[test]
fn rule_mounts_and_base_coexist() {
    let mut store = DataStore::new();
    store.insert(&["data"], json!({"a": 1})).unwrap();
    store.install_rules(
        "allow",
        vec![Rule::complete(
            "allow",
            Term::boolean(true),
            Body::new(vec![Expr::term(Term::boolean(true))]),
        )],
    );

    assert!(matches!(
        store.get(&[field("allow")]).unwrap(),
        Document::Rules(_)
    ));
    assert!(matches!(
        store.get(&[field("data"), field("a")]).unwrap(),
        Document::Data(_)
    ));
}

#[test]
fn lookup_failures_name_the_path() {
    let store = DataStore::new();
    let err = store.get(&[field("data"), field("a")]).unwrap_err();
    assert!(err.is_not_found());
    assert!(format!("{err}").contains("data.a"));
}
