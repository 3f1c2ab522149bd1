//! Trace events emitted by the proof search.

use std::cell::RefCell;
use std::rc::Rc;

use gavel_debug::{BufferTracer, TracerConfig};
use gavel_engine::{evaluate, top_down_query, Ctx, QueryParams, TraceOp};
use gavel_foundation::{Body, Expr, Rule, Term};
use gavel_storage::DataStore;

use crate::helpers::{r, scenario_store};

fn traced() -> Rc<RefCell<BufferTracer>> {
    Rc::new(RefCell::new(BufferTracer::new(
        TracerConfig::new().enabled(),
    )))
}

fn ops(tracer: &Rc<RefCell<BufferTracer>>) -> Vec<TraceOp> {
    tracer
        .borrow()
        .buffer()
        .iter()
        .map(|record| record.event.op)
        .collect()
}

#[test]
fn successful_query_brackets_with_enter_and_exit() {
    let store = scenario_store();
    let body = Body::new(vec![Expr::equality(
        r(
            "data",
            vec![
                Term::string("a"),
                Term::int(0),
                Term::string("b"),
                Term::string("c"),
                Term::int(1),
            ],
        ),
        Term::int(2),
    )]);

    let tracer = traced();
    let ctx = Ctx::new(body, &store).with_tracer(tracer.clone());
    evaluate(&ctx, &mut |_| Ok(())).unwrap();

    let ops = ops(&tracer);
    assert_eq!(ops.first(), Some(&TraceOp::Enter));
    assert!(ops.contains(&TraceOp::Eval));
    assert_eq!(ops.last(), Some(&TraceOp::Exit));
    assert!(!ops.contains(&TraceOp::Fail));
}

#[test]
fn failing_query_records_fail() {
    let store = scenario_store();
    let body = Body::new(vec![Expr::equality(
        r("data", vec![Term::string("zzz")]),
        Term::int(1),
    )]);

    let tracer = traced();
    let ctx = Ctx::new(body, &store).with_tracer(tracer.clone());
    evaluate(&ctx, &mut |_| Ok(())).unwrap();

    let ops = ops(&tracer);
    assert!(ops.contains(&TraceOp::Fail));
    assert!(!ops.contains(&TraceOp::Exit));
}

#[test]
fn multiple_results_record_redo() {
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

    let tracer = traced();
    let ctx = Ctx::new(body, &store).with_tracer(tracer.clone());
    evaluate(&ctx, &mut |_| Ok(())).unwrap();

    let ops = ops(&tracer);
    assert_eq!(ops.iter().filter(|op| **op == TraceOp::Redo).count(), 5);
    assert_eq!(ops.iter().filter(|op| **op == TraceOp::Exit).count(), 6);
}

#[test]
fn rule_dereference_traces_nested_bodies() {
    let mut store = DataStore::new();
    store.install_rules(
        "p",
        vec![Rule::partial_set(
            "p",
            Term::int(1),
            Body::new(vec![Expr::term(Term::boolean(true))]),
        )],
    );

    let tracer = traced();
    let params = QueryParams::new(&store, vec!["p".into()]).with_tracer(tracer.clone());
    top_down_query(&params).unwrap();

    // The rule body runs at depth 0 from the query entry; the buffer
    // still brackets it with Enter and Exit.
    let ops = ops(&tracer);
    assert!(ops.contains(&TraceOp::Enter));
    assert!(ops.contains(&TraceOp::Exit));
}

#[test]
fn nested_rule_bodies_trace_deeper() {
    let mut store = DataStore::new();
    store.install_rules(
        "q",
        vec![Rule::partial_set(
            "q",
            Term::int(1),
            Body::new(vec![Expr::term(Term::boolean(true))]),
        )],
    );
    store.install_rules(
        "p",
        vec![Rule::partial_set(
            "p",
            Term::var("x"),
            Body::new(vec![Expr::term(r("q", vec![Term::var("x")]))]),
        )],
    );

    let tracer = traced();
    let params = QueryParams::new(&store, vec!["p".into()]).with_tracer(tracer.clone());
    top_down_query(&params).unwrap();

    let depths: Vec<usize> = tracer
        .borrow()
        .buffer()
        .iter()
        .map(|record| record.event.depth)
        .collect();
    assert!(depths.contains(&0));
    assert!(depths.contains(&1));
}

#[test]
fn successful_path_view_keeps_enter_redo_exit() {
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

    let tracer = traced();
    let ctx = Ctx::new(body, &store).with_tracer(tracer.clone());
    evaluate(&ctx, &mut |_| Ok(())).unwrap();

    let tracer = tracer.borrow();
    let path = tracer.buffer().successful_path();
    assert!(!path.is_empty());
    assert!(path.iter().all(|record| matches!(
        record.event.op,
        TraceOp::Enter | TraceOp::Redo | TraceOp::Exit
    )));
}

#[test]
fn disabled_tracer_records_nothing() {
    let store = scenario_store();
    let body = Body::new(vec![Expr::term(Term::boolean(true))]);

    let tracer = Rc::new(RefCell::new(BufferTracer::disabled()));
    let ctx = Ctx::new(body, &store).with_tracer(tracer.clone());
    evaluate(&ctx, &mut |_| Ok(())).unwrap();

    assert!(tracer.borrow().buffer().is_empty());
}
