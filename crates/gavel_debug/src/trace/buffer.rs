//! Bounded ring buffer for trace records.

use std::collections::VecDeque;

use gavel_engine::{TraceEvent, TraceOp};

use crate::trace::record::TraceRecord;

/// A bounded buffer of trace records.
///
/// When full, the oldest records are dropped; record IDs keep counting
/// so drops are visible.
#[derive(Debug)]
pub struct TraceBuffer {
    records: VecDeque<TraceRecord>,
    capacity: usize,
    next_id: u64,
    dropped: u64,
}

impl TraceBuffer {
    /// Creates a buffer holding at most `capacity` records.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity.min(4096)),
            capacity,
            next_id: 0,
            dropped: 0,
        }
    }

    /// Appends an event, returning the assigned record ID.
    pub fn push(&mut self, timestamp_ns: u64, event: TraceEvent) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        if self.records.len() == self.capacity {
            self.records.pop_front();
            self.dropped += 1;
        }
        self.records
            .push_back(TraceRecord::new(id, timestamp_ns, event));
        id
    }

    /// Returns the number of buffered records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if no records are buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates the buffered records, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &TraceRecord> {
        self.records.iter()
    }

    /// Returns only the records on the successful path: body entries,
    /// re-entries, and satisfied bodies (`Enter`, `Redo`, `Exit`).
    #[must_use]
    pub fn successful_path(&self) -> Vec<&TraceRecord> {
        self.records
            .iter()
            .filter(|r| {
                matches!(
                    r.event.op,
                    TraceOp::Enter | TraceOp::Redo | TraceOp::Exit
                )
            })
            .collect()
    }

    /// Clears the buffer. IDs keep counting.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Returns buffer statistics.
    #[must_use]
    pub fn stats(&self) -> TraceBufferStats {
        TraceBufferStats {
            record_count: self.records.len(),
            capacity: self.capacity,
            dropped_count: self.dropped,
        }
    }
}

/// Statistics about a trace buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraceBufferStats {
    /// Records currently buffered.
    pub record_count: usize,
    /// Maximum records the buffer holds.
    pub capacity: usize,
    /// Records dropped since creation.
    pub dropped_count: u64,
}
