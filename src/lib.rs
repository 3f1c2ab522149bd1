//! Gavel - Declarative policy engine
//!
//! This crate re-exports all layers of the Gavel system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 3: gavel_debug      — Query tracing, buffered traces, formatters
//! Layer 2: gavel_engine     — Top-down evaluator, unification, query entry
//! Layer 1: gavel_storage    — Base documents, rule mounts, reference indices
//! Layer 0: gavel_foundation — Core types (Value, Term, Rule, Bindings, Error)
//! ```

pub use gavel_debug as debug;
pub use gavel_engine as engine;
pub use gavel_foundation as foundation;
pub use gavel_storage as storage;
