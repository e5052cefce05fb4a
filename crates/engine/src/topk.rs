//! Bounded top-K accumulator.
//!
//! Keeps the K greatest scoring records seen so far in a min-heap, so the
//! weakest retained record is always at the top and can be displaced in
//! O(log K). Because the record order is total and each comment is
//! inserted at most once per round, the final ranking does not depend on
//! insertion order.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use toprank_core::{ScoringRecord, ZeroScorePolicy};

/// Accumulates scoring records and keeps the best `capacity` of them.
#[derive(Debug, Clone)]
pub struct TopK {
    capacity: usize,
    zero_scores: ZeroScorePolicy,
    heap: BinaryHeap<Reverse<ScoringRecord>>,
}

impl TopK {
    /// Create an accumulator holding at most `capacity` records.
    pub fn new(capacity: usize, zero_scores: ZeroScorePolicy) -> Self {
        Self {
            capacity,
            zero_scores,
            heap: BinaryHeap::with_capacity(capacity),
        }
    }

    /// Offer a record. Returns whether it is currently retained.
    ///
    /// Once full, a record displaces the current minimum only if it
    /// compares strictly greater.
    pub fn insert(&mut self, record: ScoringRecord) -> bool {
        if record.is_zero() && self.zero_scores == ZeroScorePolicy::Exclude {
            return false;
        }
        if self.heap.len() < self.capacity {
            self.heap.push(Reverse(record));
            return true;
        }
        match self.heap.peek() {
            Some(Reverse(min)) if record > *min => {
                self.heap.pop();
                self.heap.push(Reverse(record));
                true
            }
            _ => false,
        }
    }

    /// Number of retained records.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether nothing is retained.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Retained records, best first.
    pub fn finalize(self) -> Vec<ScoringRecord> {
        // ascending in Reverse order is descending in record order
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|Reverse(r)| r)
            .collect()
    }
}
