//! Buffered tracing for Gavel queries.
//!
//! Attach a [`BufferTracer`] to a query to capture one record per
//! evaluation step, then render them with a formatter or filter down to
//! the successful path:
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use gavel_debug::{BufferTracer, TracerConfig};
//!
//! let tracer = Rc::new(RefCell::new(BufferTracer::new(
//!     TracerConfig::new().enabled(),
//! )));
//! // pass `tracer` to Ctx::with_tracer or QueryParams::with_tracer
//! ```

pub mod buffer;
pub mod format;
pub mod record;

pub use buffer::{TraceBuffer, TraceBufferStats};
pub use format::{HumanFormatter, JsonFormatter, TraceFormatter};
pub use record::TraceRecord;

use std::time::Instant;

use gavel_engine::{TraceEvent, TraceOp, Tracer};

/// Configuration for the buffering tracer.
#[derive(Clone, Debug)]
pub struct TracerConfig {
    /// Whether tracing is enabled.
    pub enabled: bool,
    /// Maximum records to keep in the buffer.
    pub buffer_size: usize,
    /// Record only these operations (empty = all).
    pub op_filter: Vec<TraceOp>,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            buffer_size: 10000,
            op_filter: Vec::new(),
        }
    }
}

impl TracerConfig {
    /// Creates a new configuration (disabled).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to enable tracing.
    #[must_use]
    pub fn enabled(mut self) -> Self {
        self.enabled = true;
        self
    }

    /// Builder method to set the buffer size.
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Builder method to record only the given operations.
    #[must_use]
    pub fn filter_ops(mut self, ops: Vec<TraceOp>) -> Self {
        self.op_filter = ops;
        self
    }
}

/// A tracer that records events into a bounded ring buffer.
///
/// Designed for zero overhead when disabled: the evaluator consults
/// [`Tracer::enabled`] before building an event.
pub struct BufferTracer {
    config: TracerConfig,
    buffer: TraceBuffer,
    start: Instant,
}

impl BufferTracer {
    /// Creates a tracer with the given configuration.
    #[must_use]
    pub fn new(config: TracerConfig) -> Self {
        let buffer_size = config.buffer_size;
        Self {
            config,
            buffer: TraceBuffer::new(buffer_size),
            start: Instant::now(),
        }
    }

    /// Creates a disabled tracer.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(TracerConfig::default())
    }

    /// Enables tracing.
    pub fn enable(&mut self) {
        self.config.enabled = true;
    }

    /// Disables tracing.
    pub fn disable(&mut self) {
        self.config.enabled = false;
    }

    /// Returns the recorded buffer.
    #[must_use]
    pub fn buffer(&self) -> &TraceBuffer {
        &self.buffer
    }

    /// Clears the buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Returns buffer statistics.
    #[must_use]
    pub fn stats(&self) -> TraceBufferStats {
        self.buffer.stats()
    }
}

impl Default for BufferTracer {
    fn default() -> Self {
        Self::disabled()
    }
}

impl Tracer for BufferTracer {
    fn enabled(&self) -> bool {
        self.config.enabled
    }

    fn trace(&mut self, event: TraceEvent) {
        if !self.config.enabled {
            return;
        }
        if !self.config.op_filter.is_empty() && !self.config.op_filter.contains(&event.op) {
            return;
        }
        #[allow(clippy::cast_possible_truncation)]
        let timestamp_ns = self.start.elapsed().as_nanos() as u64;
        self.buffer.push(timestamp_ns, event);
    }
}
