//! Core types, terms, and bindings for Gavel.
//!
//! This crate provides:
//! - [`Value`] - The policy value model (scalars, composites, variables, references)
//! - [`Term`] - A value plus optional source location
//! - [`Expr`], [`Body`], [`Rule`] - The compiled policy AST consumed by the evaluator
//! - [`Bindings`] - Persistent copy-on-write binding environment
//! - [`Error`] - Rich error types with context
//! - JSON bridge ([`value_from_json`], [`ground_to_json`])

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod bindings;
pub mod error;
pub mod json;
pub mod term;
pub mod value;

// Re-export primary types at crate root for convenience
pub use bindings::Bindings;
pub use error::{Error, ErrorContext, ErrorKind};
pub use json::{ground_to_json, value_from_json};
pub use term::{Body, DocKind, Expr, ExprTerms, Location, Rule, RuleHead, Term};
pub use value::{Ref, Value, Var};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
