//! Index build, probe, and invalidation through the store interface.

use gavel_foundation::{Bindings, Ref, Term, Value, Var};
use gavel_storage::DataStore;
use serde_json::json;

fn servers_store() -> DataStore {
    let mut store = DataStore::new();
    store
        .insert(
            &["data"],
            json!({
                "servers": [
                    {"name": "web", "port": 80},
                    {"name": "db", "port": 5432},
                    {"name": "cache", "port": 80}
                ]
            }),
        )
        .unwrap();
    store
}

fn port_ref() -> Ref {
    Ref::new(vec![
        Term::var("data"),
        Term::string("servers"),
        Term::var("i"),
        Term::string("port"),
    ])
}

fn probe(store: &DataStore, reference: &Ref, value: &Value) -> Vec<Bindings> {
    let index = store.index(reference).expect("index built");
    let mut out = Vec::new();
    index
        .iter(value, &mut |delta| {
            out.push(delta.clone());
            Ok(())
        })
        .unwrap();
    out
}

#[test]
fn build_once_and_probe() {
    let store = servers_store();
    store.build_index(&port_ref()).unwrap();
    assert_eq!(store.index_count(), 1);

    // Rebuilding is a no-op.
    store.build_index(&port_ref()).unwrap();
    assert_eq!(store.index_count(), 1);

    let hits = probe(&store, &port_ref(), &Value::Int(80));
    assert_eq!(hits.len(), 2);
    assert_eq!(
        hits[0].get(&Value::Var(Var::new("i"))),
        Some(&Value::Int(0))
    );
    assert_eq!(
        hits[1].get(&Value::Var(Var::new("i"))),
        Some(&Value::Int(2))
    );

    assert!(probe(&store, &port_ref(), &Value::Int(22)).is_empty());
}

#[test]
fn probe_errors_propagate() {
    let store = servers_store();
    store.build_index(&port_ref()).unwrap();
    let index = store.index(&port_ref()).unwrap();

    let err = index
        .iter(&Value::Int(80), &mut |_| {
            Err(gavel_foundation::Error::halted())
        })
        .unwrap_err();
    assert!(err.is_halted());
}

#[test]
fn distinct_references_get_distinct_indices() {
    let store = servers_store();
    let names = Ref::new(vec![
        Term::var("data"),
        Term::string("servers"),
        Term::var("i"),
        Term::string("name"),
    ]);
    store.build_index(&port_ref()).unwrap();
    store.build_index(&names).unwrap();
    assert_eq!(store.index_count(), 2);

    let hits = probe(&store, &names, &Value::from("db"));
    assert_eq!(hits.len(), 1);
    assert_eq!(
        hits[0].get(&Value::Var(Var::new("i"))),
        Some(&Value::Int(1))
    );
}

#[test]
fn unrelated_writes_keep_indices() {
    let mut store = servers_store();
    store.build_index(&port_ref()).unwrap();

    store.insert(&["data", "networks"], json!([])).unwrap();
    assert!(store.index(&port_ref()).is_some());

    store.insert(&["data", "servers"], json!([])).unwrap();
    assert!(store.index(&port_ref()).is_none());
}

#[test]
fn rule_installation_invalidates_shadowed_root() {
    let mut store = servers_store();
    store.build_index(&port_ref()).unwrap();

    // Mounting rules at `data` shadows the base document.
    store.install_rules("data", Vec::new());
    assert!(store.index(&port_ref()).is_none());
}
