//! The tracing hook for the evaluator.
//!
//! When a tracer is attached to a context, the proof search emits one
//! event per step. The `gavel_debug` crate provides a buffering
//! implementation with formatters; hosts may implement [`Tracer`]
//! directly.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use gavel_foundation::{Bindings, Expr};

/// What happened at an evaluation step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraceOp {
    /// A body was entered.
    Enter,
    /// An expression is about to be evaluated.
    Eval,
    /// A body was satisfied; bindings are complete and ground.
    Exit,
    /// An already-satisfied expression produced another result.
    Redo,
    /// An expression produced no results.
    Fail,
}

impl fmt::Display for TraceOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enter => write!(f, "Enter"),
            Self::Eval => write!(f, "Eval"),
            Self::Exit => write!(f, "Exit"),
            Self::Redo => write!(f, "Redo"),
            Self::Fail => write!(f, "Fail"),
        }
    }
}

/// One evaluation-step event.
#[derive(Clone, Debug)]
pub struct TraceEvent {
    /// The step kind.
    pub op: TraceOp,
    /// The expression involved, if the step concerns one.
    pub expr: Option<Expr>,
    /// The bindings at the time of the event.
    pub bindings: Bindings,
    /// Depth of the context (rule dereference nesting).
    pub depth: usize,
    /// Depth of the parent context, if any.
    pub parent_depth: Option<usize>,
}

impl TraceEvent {
    /// Returns a short name for the event kind.
    #[must_use]
    pub fn op_name(&self) -> &'static str {
        match self.op {
            TraceOp::Enter => "enter",
            TraceOp::Eval => "eval",
            TraceOp::Exit => "exit",
            TraceOp::Redo => "redo",
            TraceOp::Fail => "fail",
        }
    }
}

/// Receives evaluation-step events.
pub trait Tracer {
    /// Returns whether tracing is enabled; when false, the evaluator
    /// skips event construction entirely.
    fn enabled(&self) -> bool;

    /// Records one event.
    fn trace(&mut self, event: TraceEvent);
}

/// A shared, interior-mutable tracer handle carried by contexts.
pub type TracerHandle = Rc<RefCell<dyn Tracer>>;
