//! The binding environment as used by the evaluator.

use gavel_foundation::{Bindings, Ref, Term, Value, Var};

fn var(name: &str) -> Value {
    Value::Var(Var::new(name))
}

#[test]
fn derivations_share_structure_without_aliasing() {
    let root = Bindings::new().put(var("a"), Value::Int(1));

    let left = root.put(var("b"), Value::Int(2));
    let right = root.put(var("b"), Value::Int(3));

    assert_eq!(left.get(&var("b")), Some(&Value::Int(2)));
    assert_eq!(right.get(&var("b")), Some(&Value::Int(3)));
    assert_eq!(root.get(&var("b")), None);
    assert_eq!(root.len(), 1);
}

#[test]
fn references_and_variables_coexist_as_keys() {
    let p_x = Value::Ref(Ref::new(vec![Term::var("p"), Term::var("x")]));
    let b = Bindings::new()
        .put(var("x"), Value::Int(1))
        .put(p_x.clone(), Value::Bool(true));

    assert_eq!(b.len(), 2);
    assert_eq!(b.get(&p_x), Some(&Value::Bool(true)));
    assert_eq!(b.get(&var("x")), Some(&Value::Int(1)));
}

#[test]
fn update_merges_binding_deltas() {
    // The index probe path merges deltas into the current environment.
    let current = Bindings::new().put(var("x"), Value::Int(1));
    let delta = Bindings::new()
        .put(var("i"), Value::Int(0))
        .put(var("j"), Value::Int(1));

    let merged = current.update(&delta);
    assert_eq!(merged.len(), 3);
    assert_eq!(merged.get(&var("x")), Some(&Value::Int(1)));
    assert_eq!(merged.get(&var("i")), Some(&Value::Int(0)));
}

#[test]
fn ground_check_covers_all_entries() {
    let open = Bindings::new()
        .put(var("x"), Value::Int(1))
        .put(var("y"), var("z"));
    assert!(open.iter().any(|(_, v)| !v.is_ground()));

    let closed = Bindings::new()
        .put(var("x"), Value::Int(1))
        .put(var("y"), Value::from("s"));
    assert!(closed.iter().all(|(_, v)| v.is_ground()));
}
