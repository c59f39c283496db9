//! The scheduler worker's main loop.
//!
//! Each iteration:
//! 1. drain up to `batch_size` events from the intake;
//! 2. route each to the due list or the pending heap;
//! 3. pop every pending event that has become due;
//! 4. sort the due list by `(due, seq)` and write it to the sink, batching
//!    channel messages and isolating each sysex block in its own call;
//! 5. sleep whatever is left of the tick.
//!
//! The loop never sleeps to catch up and never drops events under load: when
//! an iteration overruns the tick it starts the next one immediately and the
//! overrun shows up as jitter.

use super::config::{FlushPolicy, SilencePolicy};
use super::Shared;
use crate::event::TimedEvent;
use crate::heap::PendingHeap;
use crate::intake::IntakeReceiver;
use crate::jitter::JitterMonitor;
use crate::sink::Sink;
use crate::tempo::saturating_duration;
use std::sync::Arc;
use tactus_midi::RawMessage;
use tracing::{debug, error, trace, warn};

#[derive(Debug, Clone, Copy)]
pub(crate) struct LoopOptions {
    pub batch_size: usize,
    pub flush_policy: FlushPolicy,
    pub silence_policy: SilencePolicy,
    pub jitter_window: Option<usize>,
}

/// Everything a worker needs to run a loop, handed over on `start()`.
pub(crate) struct WorkerContext {
    pub shared: Arc<Shared>,
    pub intake: IntakeReceiver,
    pub options: LoopOptions,
    pub thread_name: String,
}

pub(crate) struct SchedulerLoop {
    sink: Box<dyn Sink>,
    intake: IntakeReceiver,
    shared: Arc<Shared>,
    options: LoopOptions,
    pending: PendingHeap,
    due: Vec<TimedEvent>,
    batch: Vec<RawMessage>,
    jitter: Option<JitterMonitor>,
    tick: u64,
}

impl SchedulerLoop {
    pub(crate) fn new(sink: Box<dyn Sink>, ctx: WorkerContext) -> Self {
        let WorkerContext {
            shared,
            intake,
            options,
            ..
        } = ctx;
        Self {
            sink,
            intake,
            shared,
            options,
            pending: PendingHeap::with_capacity(options.batch_size),
            due: Vec::with_capacity(options.batch_size),
            batch: Vec::with_capacity(options.batch_size),
            jitter: options.jitter_window.map(JitterMonitor::new),
            tick: 0,
        }
    }

    pub(crate) fn run(mut self) {
        debug!(
            bpm = self.shared.tempo.bpm(),
            ppqn = self.shared.tempo.ppqn(),
            "scheduler loop started"
        );

        while !self.shared.shutdown_requested() {
            self.iterate();
        }

        debug!(
            ticks = self.tick,
            pending = self.pending.len(),
            "scheduler loop exited"
        );
        self.finish();
    }

    fn iterate(&mut self) {
        let now = self.shared.clock.now();
        // Read once; a tempo change lands on the next iteration.
        let resolution = self.shared.tempo.resolution_secs();

        self.collect_due(now);
        if !self.due.is_empty() {
            self.dispatch_due();
        }

        self.tick += 1;
        self.shared.diagnostics.record_tick();

        let elapsed = self.shared.clock.now() - now;
        if elapsed < resolution {
            self.shared.sleep(saturating_duration(resolution - elapsed));
        }
    }

    fn collect_due(&mut self, now: f64) {
        let due = &mut self.due;
        let pending = &mut self.pending;
        self.intake.drain(self.options.batch_size, |event| {
            if event.is_due(now) {
                due.push(event);
            } else {
                pending.push(event);
            }
        });

        while let Some(event) = self.pending.pop_due(now) {
            self.due.push(event);
        }

        self.due.sort_unstable();
        debug_assert!(self.pending.peek_min().map_or(true, |next| !next.is_due(now)));
    }

    fn dispatch_due(&mut self) {
        let dispatch_time = self.shared.clock.now();
        let mut due = std::mem::take(&mut self.due);

        for event in due.drain(..) {
            if let Some(monitor) = self.jitter.as_mut() {
                if let Some(report) = monitor.record(dispatch_time - event.due()) {
                    debug!(
                        count = report.count,
                        mean_ms = report.mean * 1e3,
                        min_ms = report.min * 1e3,
                        max_ms = report.max * 1e3,
                        "dispatch jitter"
                    );
                    self.shared.diagnostics.publish_jitter(report);
                }
            }
            self.stage(event.into_message());
        }
        self.flush_batch();

        // Keep the allocation for the next tick
        self.due = due;
    }

    /// Queues a message for the current batch. A sysex block first flushes
    /// whatever is queued, then goes out alone.
    fn stage(&mut self, message: RawMessage) {
        if message.is_sysex() {
            self.flush_batch();
            self.shared.diagnostics.record_dispatched(1);
            if let Err(e) = self.sink.send_sysex(&message) {
                warn!(error = %e, bytes = message.len(), "sink sysex write failed");
                self.shared.diagnostics.record_sink_failure();
            }
        } else {
            self.batch.push(message);
        }
    }

    fn flush_batch(&mut self) {
        if self.batch.is_empty() {
            return;
        }
        trace!(count = self.batch.len(), tick = self.tick, "dispatching batch");
        self.shared.diagnostics.record_dispatched(self.batch.len());
        if let Err(e) = self.sink.send(&self.batch) {
            warn!(error = %e, count = self.batch.len(), "sink write failed, batch dropped");
            self.shared.diagnostics.record_sink_failure();
        }
        self.batch.clear();
    }

    fn finish(mut self) {
        match self.options.flush_policy {
            FlushPolicy::Discard => {
                let discarded = self.pending.len() + self.intake.discard_all();
                self.pending.clear();
                if discarded > 0 {
                    warn!(discarded, "discarding pending events on stop");
                    self.shared.diagnostics.record_discarded(discarded);
                }
            }
            FlushPolicy::FastForward => {
                let pending = &mut self.pending;
                self.intake.drain(usize::MAX, |event| pending.push(event));
                let events = self.pending.drain_sorted();
                debug!(count = events.len(), "fast-forwarding pending events");
                for event in events {
                    self.stage(event.into_message());
                }
                self.flush_batch();
            }
        }

        let silence = self.options.silence_policy.messages();
        if !silence.is_empty() {
            debug!(
                policy = ?self.options.silence_policy,
                count = silence.len(),
                "sending silence messages"
            );
            if let Err(e) = self.sink.send(&silence) {
                warn!(error = %e, "failed to send silence messages");
                self.shared.diagnostics.record_sink_failure();
            }
        }

        if let Err(e) = self.sink.close() {
            error!(error = %e, "failed to close sink");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::intake::{intake_channel, IntakeSender};
    use crate::sink::SinkError;
    use crate::tempo::{Tempo, TempoController};
    use parking_lot::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Batch(Vec<RawMessage>),
        Sysex(RawMessage),
        Close,
    }

    #[derive(Clone, Default)]
    struct VecSink {
        calls: Arc<Mutex<Vec<Call>>>,
        failures_left: Arc<Mutex<usize>>,
    }

    impl Sink for VecSink {
        fn send(&mut self, batch: &[RawMessage]) -> Result<(), SinkError> {
            let mut failures = self.failures_left.lock();
            if *failures > 0 {
                *failures -= 1;
                return Err(SinkError::Write("device unplugged".into()));
            }
            self.calls.lock().push(Call::Batch(batch.to_vec()));
            Ok(())
        }

        fn send_sysex(&mut self, message: &RawMessage) -> Result<(), SinkError> {
            self.calls.lock().push(Call::Sysex(message.clone()));
            Ok(())
        }

        fn close(&mut self) -> Result<(), SinkError> {
            self.calls.lock().push(Call::Close);
            Ok(())
        }
    }

    struct Fixture {
        clock: Arc<ManualClock>,
        shared: Arc<Shared>,
        tx: IntakeSender,
        sink: VecSink,
        run_loop: SchedulerLoop,
    }

    fn fixture(options: LoopOptions) -> Fixture {
        let clock = Arc::new(ManualClock::new(10.0));
        let tempo = TempoController::new(Tempo::new(120.0, 480).unwrap());
        let shared = Arc::new(Shared::new(tempo, clock.clone()));
        let (tx, rx) = intake_channel(None, None);
        let sink = VecSink::default();
        let ctx = WorkerContext {
            shared: Arc::clone(&shared),
            intake: rx,
            options,
            thread_name: "test".into(),
        };
        let run_loop = SchedulerLoop::new(Box::new(sink.clone()), ctx);
        Fixture {
            clock,
            shared,
            tx,
            sink,
            run_loop,
        }
    }

    fn options() -> LoopOptions {
        LoopOptions {
            batch_size: 100,
            flush_policy: FlushPolicy::Discard,
            silence_policy: SilencePolicy::AllNotesOff,
            jitter_window: Some(2),
        }
    }

    #[test]
    fn test_collect_routes_due_and_pending() {
        let mut f = fixture(options());
        f.tx.submit(9.0, RawMessage::note_on(0, 60, 100)).unwrap();
        f.tx.submit(10.0, RawMessage::note_on(0, 61, 100)).unwrap();
        f.tx.submit(10.5, RawMessage::note_on(0, 62, 100)).unwrap();

        f.run_loop.collect_due(10.0);
        assert_eq!(f.run_loop.due.len(), 2);
        assert_eq!(f.run_loop.pending.len(), 1);
    }

    #[test]
    fn test_collect_drains_at_most_batch_size() {
        let mut f = fixture(LoopOptions {
            batch_size: 3,
            ..options()
        });
        for _ in 0..5 {
            f.tx.submit(10.0, RawMessage::timing_clock()).unwrap();
        }

        f.run_loop.collect_due(10.0);
        assert_eq!(f.run_loop.due.len(), 3);
        assert_eq!(f.tx.queued(), 2);
    }

    #[test]
    fn test_iteration_dispatches_in_due_order() {
        let mut f = fixture(options());
        f.tx.submit(10.3, RawMessage::note_on(0, 3, 1)).unwrap();
        f.tx.submit(10.1, RawMessage::note_on(0, 1, 1)).unwrap();
        f.tx.submit(10.2, RawMessage::note_on(0, 2, 1)).unwrap();

        f.run_loop.iterate();
        assert!(f.sink.calls.lock().is_empty());

        f.clock.set(11.0);
        f.run_loop.iterate();
        assert_eq!(
            *f.sink.calls.lock(),
            vec![Call::Batch(vec![
                RawMessage::note_on(0, 1, 1),
                RawMessage::note_on(0, 2, 1),
                RawMessage::note_on(0, 3, 1),
            ])]
        );
        assert_eq!(f.shared.diagnostics.ticks(), 2);
        assert_eq!(f.shared.diagnostics.dispatched(), 3);
    }

    #[test]
    fn test_sysex_is_isolated_from_batch() {
        let mut f = fixture(options());
        let sysex = RawMessage::new([0xF0, 0x7E, 0x7F, 0x06, 0x01, 0xF7]).unwrap();
        f.tx.submit(10.0, RawMessage::note_on(0, 60, 100)).unwrap();
        f.tx.submit(10.0, sysex.clone()).unwrap();
        f.tx.submit(10.0, RawMessage::note_off(0, 60, 0)).unwrap();

        f.run_loop.iterate();
        assert_eq!(
            *f.sink.calls.lock(),
            vec![
                Call::Batch(vec![RawMessage::note_on(0, 60, 100)]),
                Call::Sysex(sysex),
                Call::Batch(vec![RawMessage::note_off(0, 60, 0)]),
            ]
        );
    }

    #[test]
    fn test_failed_write_does_not_stop_dispatch() {
        let mut f = fixture(options());
        *f.sink.failures_left.lock() = 1;

        f.tx.submit(10.0, RawMessage::note_on(0, 60, 100)).unwrap();
        f.run_loop.iterate();
        f.tx.submit(10.0, RawMessage::note_on(0, 62, 100)).unwrap();
        f.run_loop.iterate();

        assert_eq!(
            *f.sink.calls.lock(),
            vec![Call::Batch(vec![RawMessage::note_on(0, 62, 100)])]
        );
        assert_eq!(f.shared.diagnostics.sink_failures(), 1);
    }

    #[test]
    fn test_jitter_report_is_published() {
        let mut f = fixture(options());
        f.tx.submit(9.75, RawMessage::timing_clock()).unwrap();
        f.tx.submit(9.5, RawMessage::timing_clock()).unwrap();
        f.run_loop.iterate();

        let report = f.shared.diagnostics.last_jitter().unwrap();
        assert_eq!(report.count, 2);
        assert_eq!(report.min, 0.25);
        assert_eq!(report.max, 0.5);
    }

    #[test]
    fn test_finish_discards_pending_then_silences_and_closes() {
        let mut f = fixture(options());
        f.tx.submit(20.0, RawMessage::note_on(0, 60, 100)).unwrap();
        f.run_loop.iterate();
        f.tx.submit(30.0, RawMessage::note_on(0, 61, 100)).unwrap();

        let calls = Arc::clone(&f.sink.calls);
        let diagnostics = Arc::clone(&f.shared.diagnostics);
        f.run_loop.finish();

        let calls = calls.lock();
        assert_eq!(calls.len(), 2);
        match &calls[0] {
            Call::Batch(batch) => {
                assert_eq!(batch.len(), 16);
                assert!(batch.iter().all(|m| m.as_bytes()[1] == 123));
            }
            other => panic!("expected silence batch, got {:?}", other),
        }
        assert_eq!(calls[1], Call::Close);
        assert_eq!(diagnostics.discarded_on_stop(), 2);
    }

    #[test]
    fn test_finish_fast_forwards_pending_in_order() {
        let mut f = fixture(LoopOptions {
            flush_policy: FlushPolicy::FastForward,
            silence_policy: SilencePolicy::Off,
            ..options()
        });
        f.tx.submit(30.0, RawMessage::note_on(0, 2, 1)).unwrap();
        f.tx.submit(20.0, RawMessage::note_on(0, 1, 1)).unwrap();
        f.run_loop.iterate();
        f.tx.submit(40.0, RawMessage::note_on(0, 3, 1)).unwrap();

        let calls = Arc::clone(&f.sink.calls);
        f.run_loop.finish();

        assert_eq!(
            *calls.lock(),
            vec![
                Call::Batch(vec![
                    RawMessage::note_on(0, 1, 1),
                    RawMessage::note_on(0, 2, 1),
                    RawMessage::note_on(0, 3, 1),
                ]),
                Call::Close,
            ]
        );
    }
}
