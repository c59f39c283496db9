//! Time-tagged MIDI payloads.

use std::cmp::Ordering;
use tactus_midi::RawMessage;

/// A message and the absolute instant it should leave the scheduler.
///
/// Ordered by `(due, seq)`. `seq` is a global submission counter assigned at
/// `send()`, so events with equal due times keep the order producers
/// submitted them in even if they were drained on different loop iterations.
#[derive(Debug, Clone)]
pub struct TimedEvent {
    due: f64,
    seq: u64,
    message: RawMessage,
}

impl TimedEvent {
    pub(crate) fn new(due: f64, seq: u64, message: RawMessage) -> Self {
        debug_assert!(due.is_finite(), "due time must be finite");
        Self { due, seq, message }
    }

    #[inline]
    pub fn due(&self) -> f64 {
        self.due
    }

    #[inline]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    #[inline]
    pub fn message(&self) -> &RawMessage {
        &self.message
    }

    #[inline]
    pub fn into_message(self) -> RawMessage {
        self.message
    }

    #[inline]
    pub fn is_due(&self, now: f64) -> bool {
        self.due <= now
    }
}

impl PartialEq for TimedEvent {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TimedEvent {}

impl PartialOrd for TimedEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimedEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        self.due
            .total_cmp(&other.due)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orders_by_due_then_seq() {
        let a = TimedEvent::new(1.0, 5, RawMessage::note_on(0, 60, 100));
        let b = TimedEvent::new(2.0, 1, RawMessage::note_on(0, 62, 100));
        let c = TimedEvent::new(1.0, 6, RawMessage::note_on(0, 64, 100));

        assert!(a < b);
        assert!(a < c);
        assert!(c < b);
    }

    #[test]
    fn test_is_due() {
        let event = TimedEvent::new(1.5, 0, RawMessage::timing_clock());
        assert!(!event.is_due(1.499));
        assert!(event.is_due(1.5));
        assert!(event.is_due(2.0));
    }
}
