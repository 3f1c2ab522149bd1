//! Trace record types.

use gavel_engine::TraceEvent;

/// A numbered, timestamped trace record.
#[derive(Clone, Debug)]
pub struct TraceRecord {
    /// Unique record ID within the tracer's lifetime.
    pub id: u64,
    /// Timestamp in nanoseconds since the tracer was created.
    pub timestamp_ns: u64,
    /// The evaluation-step event.
    pub event: TraceEvent,
}

impl TraceRecord {
    /// Creates a new trace record.
    #[must_use]
    pub fn new(id: u64, timestamp_ns: u64, event: TraceEvent) -> Self {
        Self {
            id,
            timestamp_ns,
            event,
        }
    }

    /// Returns the event kind name.
    #[must_use]
    pub fn op_name(&self) -> &'static str {
        self.event.op_name()
    }
}
