//! Tracing and debugging support for Gavel queries.
//!
//! This crate provides:
//! - [`BufferTracer`] - a [`gavel_engine::Tracer`] that records events
//!   into a bounded ring buffer
//! - [`TracerConfig`] - tracer configuration (builder style)
//! - [`HumanFormatter`], [`JsonFormatter`] - trace rendering

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod trace;

pub use trace::{
    BufferTracer, HumanFormatter, JsonFormatter, TraceBuffer, TraceBufferStats, TraceFormatter,
    TraceRecord, TracerConfig,
};
