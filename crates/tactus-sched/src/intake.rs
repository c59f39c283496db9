//! Many-producer, single-consumer hand-off into the scheduler loop.
//!
//! Producers stamp each event with a global sequence number at submission
//! and push it onto a crossbeam channel. Only the loop drains it.

use crate::error::{Error, Result};
use crate::event::TimedEvent;
use crossbeam_channel::{bounded, unbounded, Receiver, SendTimeoutError, Sender, TrySendError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tactus_midi::RawMessage;

/// Producer side. Cheap to clone.
#[derive(Clone)]
pub struct IntakeSender {
    tx: Sender<TimedEvent>,
    sequence: Arc<AtomicU64>,
    send_timeout: Option<Duration>,
}

/// Consumer side, held by the scheduler and lent to the running loop.
#[derive(Clone)]
pub struct IntakeReceiver {
    rx: Receiver<TimedEvent>,
}

/// `capacity: None` is unbounded and never reports [`Error::QueueFull`].
/// With a bound, `send_timeout` is how long a producer may block on a full
/// queue; `None` fails immediately.
pub fn intake_channel(
    capacity: Option<usize>,
    send_timeout: Option<Duration>,
) -> (IntakeSender, IntakeReceiver) {
    let (tx, rx) = match capacity {
        Some(capacity) => bounded(capacity),
        None => unbounded(),
    };
    (
        IntakeSender {
            tx,
            sequence: Arc::new(AtomicU64::new(0)),
            send_timeout,
        },
        IntakeReceiver { rx },
    )
}

impl IntakeSender {
    pub fn submit(&self, due: f64, message: RawMessage) -> Result<()> {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        let event = TimedEvent::new(due, seq, message);

        match self.send_timeout {
            None => self.tx.try_send(event).map_err(|e| match e {
                TrySendError::Full(_) => Error::QueueFull,
                TrySendError::Disconnected(_) => Error::Closed,
            }),
            Some(timeout) => self.tx.send_timeout(event, timeout).map_err(|e| match e {
                SendTimeoutError::Timeout(_) => Error::QueueFull,
                SendTimeoutError::Disconnected(_) => Error::Closed,
            }),
        }
    }

    /// Events submitted but not yet drained.
    pub fn queued(&self) -> usize {
        self.tx.len()
    }
}

impl IntakeReceiver {
    /// Hands at most `max` queued events to `f` without blocking.
    pub fn drain(&self, max: usize, mut f: impl FnMut(TimedEvent)) -> usize {
        let mut taken = 0;
        while taken < max {
            match self.rx.try_recv() {
                Ok(event) => {
                    f(event);
                    taken += 1;
                }
                Err(_) => break,
            }
        }
        taken
    }

    /// Drops everything currently queued.
    pub fn discard_all(&self) -> usize {
        self.rx.try_iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_sequence_numbers_are_assigned_at_submit() {
        let (tx, rx) = intake_channel(None, None);
        tx.submit(2.0, RawMessage::note_on(0, 60, 100)).unwrap();
        tx.submit(1.0, RawMessage::note_on(0, 62, 100)).unwrap();

        let mut seqs = Vec::new();
        rx.drain(usize::MAX, |e| seqs.push(e.seq()));
        assert_eq!(seqs, vec![0, 1]);
    }

    #[test]
    fn test_drain_respects_batch_size() {
        let (tx, rx) = intake_channel(None, None);
        for i in 0..10 {
            tx.submit(i as f64, RawMessage::timing_clock()).unwrap();
        }

        assert_eq!(rx.drain(4, |_| {}), 4);
        assert_eq!(tx.queued(), 6);
        assert_eq!(rx.drain(100, |_| {}), 6);
        assert!(rx.is_empty());
    }

    #[test]
    fn test_bounded_queue_reports_full() {
        let (tx, _rx) = intake_channel(Some(2), None);
        tx.submit(0.0, RawMessage::timing_clock()).unwrap();
        tx.submit(0.0, RawMessage::timing_clock()).unwrap();

        assert!(matches!(
            tx.submit(0.0, RawMessage::timing_clock()),
            Err(Error::QueueFull)
        ));
    }

    #[test]
    fn test_bounded_queue_with_timeout_reports_full() {
        let (tx, _rx) = intake_channel(Some(1), Some(Duration::from_millis(5)));
        tx.submit(0.0, RawMessage::timing_clock()).unwrap();

        assert!(matches!(
            tx.submit(0.0, RawMessage::timing_clock()),
            Err(Error::QueueFull)
        ));
    }

    #[test]
    fn test_disconnected_receiver_reports_closed() {
        let (tx, rx) = intake_channel(None, None);
        drop(rx);
        assert!(matches!(
            tx.submit(0.0, RawMessage::timing_clock()),
            Err(Error::Closed)
        ));
    }

    #[test]
    fn test_concurrent_producers_get_unique_sequence_numbers() {
        let (tx, rx) = intake_channel(None, None);
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let tx = tx.clone();
                thread::spawn(move || {
                    for _ in 0..250 {
                        tx.submit(0.0, RawMessage::timing_clock()).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let mut seqs = Vec::new();
        rx.drain(usize::MAX, |e| seqs.push(e.seq()));
        seqs.sort_unstable();
        seqs.dedup();
        assert_eq!(seqs.len(), 1000);
    }

    #[test]
    fn test_discard_all() {
        let (tx, rx) = intake_channel(None, None);
        for _ in 0..3 {
            tx.submit(0.0, RawMessage::timing_clock()).unwrap();
        }
        assert_eq!(rx.discard_all(), 3);
        assert!(rx.is_empty());
    }
}
