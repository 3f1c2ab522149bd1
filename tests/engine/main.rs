//! Integration tests for Layer 2: Engine
//!
//! Tests for the proof search, rule dereference, indexing, tracing, and
//! cancellation.

mod helpers;

mod indexing;
mod rules;
mod tracing;
