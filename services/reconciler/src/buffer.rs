//! Per-channel ordering buffer
//!
//! Holds future messages (sequence numbers beyond the applied prefix) until
//! the gap in front of them fills. A min-heap keyed by sequence number so
//! the next applicable message is always at the top. Bounded: once the
//! buffer reaches capacity, further future arrivals are refused.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use types::envelope::RocketMessage;

/// Heap element ordered by sequence number only.
struct Pending(RocketMessage);

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.0.number == other.0.number
    }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.number.cmp(&other.0.number)
    }
}

/// Bounded min-heap of out-of-order messages for one channel
pub struct MessageBuffer {
    heap: BinaryHeap<Reverse<Pending>>,
    capacity: usize,
}

impl MessageBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::new(),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Sequence number of the earliest buffered message, if any.
    pub fn next_number(&self) -> Option<u64> {
        self.heap.peek().map(|Reverse(p)| p.0.number)
    }

    /// Whether a message with this sequence number is already buffered.
    ///
    /// Sequence numbers are unique per channel, so a hit means the incoming
    /// message is a duplicate of a buffered one.
    pub fn contains(&self, number: u64) -> bool {
        self.heap.iter().any(|Reverse(p)| p.0.number == number)
    }

    /// Buffer a future message. Returns `false` if the buffer is full.
    pub fn push(&mut self, msg: RocketMessage) -> bool {
        if self.heap.len() >= self.capacity {
            return false;
        }
        self.heap.push(Reverse(Pending(msg)));
        true
    }

    /// Pop the earliest buffered message iff its number equals `next`.
    pub fn pop_if(&mut self, next: u64) -> Option<RocketMessage> {
        match self.next_number() {
            Some(n) if n == next => self.heap.pop().map(|Reverse(p)| p.0),
            _ => None,
        }
    }

    /// Drop every buffered message that is not a launch.
    ///
    /// Called when the rocket explodes: queued speed and mission traffic can
    /// never apply again, but buffered relaunches stay eligible.
    pub fn retain_relaunches(&mut self) {
        let kept: Vec<Reverse<Pending>> = self
            .heap
            .drain()
            .filter(|Reverse(p)| p.0.body.is_launch())
            .collect();
        self.heap = kept.into_iter().collect();
    }
}
