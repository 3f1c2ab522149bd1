//! The top-down query evaluator for Gavel.
//!
//! This crate implements the recursive, backtracking proof search that
//! produces all sets of bindings satisfying a query body over a hybrid
//! world of concrete JSON data in storage and virtual documents defined
//! by rules.
//!
//! The pieces:
//! - [`Ctx`] - per-step evaluation context (query, bindings, position)
//! - [`evaluate`] - the proof search over a body
//! - [`unify`] - two-sided unification with occurs check
//! - [`eval_ref`] - reference resolution and rule dereference
//! - [`Builtins`] - the built-in registry (ships with `=`)
//! - [`top_down_query`] - materialize a named document as a value
//! - [`Tracer`] - hook receiving one event per evaluation step

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod builtins;
pub mod context;
pub mod convert;
pub mod eval;
pub mod plug;
pub mod query;
pub mod refs;
pub mod terms;
pub mod trace;
pub mod unify;

pub use builtins::{BuiltinFn, Builtins};
pub use context::Ctx;
pub use convert::{compare, value_to_json};
pub use eval::evaluate;
pub use plug::{plug_expr, plug_term, plug_value};
pub use query::{top_down_query, QueryParams, QueryResult};
pub use refs::eval_ref;
pub use trace::{TraceEvent, TraceOp, Tracer, TracerHandle};
pub use unify::unify;
