//! Min-heap of not-yet-due events.
//!
//! Owned exclusively by the scheduler loop, so no internal locking.

use crate::event::TimedEvent;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

#[derive(Debug, Default)]
pub struct PendingHeap {
    heap: BinaryHeap<Reverse<TimedEvent>>,
}

impl PendingHeap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn push(&mut self, event: TimedEvent) {
        self.heap.push(Reverse(event));
    }

    #[inline]
    pub fn peek_min(&self) -> Option<&TimedEvent> {
        self.heap.peek().map(|Reverse(event)| event)
    }

    #[inline]
    pub fn pop_min(&mut self) -> Option<TimedEvent> {
        self.heap.pop().map(|Reverse(event)| event)
    }

    /// Pops the earliest event if it is due at `now`.
    #[inline]
    pub fn pop_due(&mut self, now: f64) -> Option<TimedEvent> {
        match self.peek_min() {
            Some(event) if event.is_due(now) => self.pop_min(),
            _ => None,
        }
    }

    /// Removes every event, earliest first.
    pub fn drain_sorted(&mut self) -> Vec<TimedEvent> {
        let mut events: Vec<TimedEvent> = self.heap.drain().map(|Reverse(event)| event).collect();
        events.sort_unstable();
        events
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }
}
