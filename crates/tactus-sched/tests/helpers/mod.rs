//! Test sinks and fixtures for scheduler integration tests.
//!
//! Every sink here records into a shared [`SinkLog`] so the test can keep
//! inspecting deliveries after the sink itself has moved into the worker.

#![allow(dead_code)]

pub mod tolerances;

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tactus_sched::{Clock, Diagnostics, ManualClock, RawMessage, Sink, SinkError};

/// One call observed by a recording sink.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Batch(Vec<Vec<u8>>),
    Sysex(Vec<u8>),
    Closed,
}

#[derive(Debug, Clone)]
pub struct Record {
    /// Scheduler clock time of the call.
    pub at: f64,
    pub delivery: Delivery,
}

#[derive(Clone, Default)]
pub struct SinkLog {
    records: Arc<Mutex<Vec<Record>>>,
}

impl SinkLog {
    fn push(&self, at: f64, delivery: Delivery) {
        self.records.lock().push(Record { at, delivery });
    }

    pub fn records(&self) -> Vec<Record> {
        self.records.lock().clone()
    }

    /// Every message delivered, flattened, with the time it went out.
    pub fn messages(&self) -> Vec<(f64, Vec<u8>)> {
        let mut out = Vec::new();
        for record in self.records.lock().iter() {
            match &record.delivery {
                Delivery::Batch(batch) => {
                    out.extend(batch.iter().map(|m| (record.at, m.clone())));
                }
                Delivery::Sysex(bytes) => out.push((record.at, bytes.clone())),
                Delivery::Closed => {}
            }
        }
        out
    }

    pub fn message_count(&self) -> usize {
        self.messages().len()
    }

    /// Polls until at least `count` messages were delivered.
    pub fn wait_for_messages(&self, count: usize, timeout: Duration) -> bool {
        wait_until(timeout, || self.message_count() >= count)
    }

    pub fn is_closed(&self) -> bool {
        self.records
            .lock()
            .iter()
            .any(|r| r.delivery == Delivery::Closed)
    }
}

fn to_bytes(batch: &[RawMessage]) -> Vec<Vec<u8>> {
    batch.iter().map(|m| m.as_bytes().to_vec()).collect()
}

/// Records every call, stamped with the scheduler's clock.
#[derive(Clone)]
pub struct RecordingSink {
    log: SinkLog,
    clock: Arc<dyn Clock>,
}

impl RecordingSink {
    pub fn new(clock: Arc<dyn Clock>) -> (Self, SinkLog) {
        let log = SinkLog::default();
        (
            Self {
                log: log.clone(),
                clock,
            },
            log,
        )
    }
}

impl Sink for RecordingSink {
    fn send(&mut self, batch: &[RawMessage]) -> Result<(), SinkError> {
        self.log.push(self.clock.now(), Delivery::Batch(to_bytes(batch)));
        Ok(())
    }

    fn send_sysex(&mut self, message: &RawMessage) -> Result<(), SinkError> {
        self.log
            .push(self.clock.now(), Delivery::Sysex(message.as_bytes().to_vec()));
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        self.log.push(self.clock.now(), Delivery::Closed);
        Ok(())
    }
}

/// Fails the first `failures` batch writes, then records like
/// [`RecordingSink`].
pub struct FlakySink {
    inner: RecordingSink,
    failures: Arc<AtomicUsize>,
}

impl FlakySink {
    pub fn new(clock: Arc<dyn Clock>, failures: usize) -> (Self, SinkLog) {
        let (inner, log) = RecordingSink::new(clock);
        (
            Self {
                inner,
                failures: Arc::new(AtomicUsize::new(failures)),
            },
            log,
        )
    }
}

impl Sink for FlakySink {
    fn send(&mut self, batch: &[RawMessage]) -> Result<(), SinkError> {
        let left = self.failures.load(Ordering::Relaxed);
        if left > 0 {
            self.failures.store(left - 1, Ordering::Relaxed);
            return Err(SinkError::Write("port went away".into()));
        }
        self.inner.send(batch)
    }

    fn send_sysex(&mut self, message: &RawMessage) -> Result<(), SinkError> {
        self.inner.send_sysex(message)
    }

    fn close(&mut self) -> Result<(), SinkError> {
        self.inner.close()
    }
}

/// A sink whose `close()` blocks until the test releases it.
pub struct StuckSink {
    inner: RecordingSink,
    release: Receiver<()>,
}

impl StuckSink {
    pub fn new(clock: Arc<dyn Clock>) -> (Self, SinkLog, Sender<()>) {
        let (inner, log) = RecordingSink::new(clock);
        let (release_tx, release) = bounded(1);
        (Self { inner, release }, log, release_tx)
    }
}

impl Sink for StuckSink {
    fn send(&mut self, batch: &[RawMessage]) -> Result<(), SinkError> {
        self.inner.send(batch)
    }

    fn send_sysex(&mut self, message: &RawMessage) -> Result<(), SinkError> {
        self.inner.send_sysex(message)
    }

    fn close(&mut self) -> Result<(), SinkError> {
        let _ = self.release.recv();
        self.inner.close()
    }
}

/// A manual clock parked at a non-zero time, shared as `dyn Clock`.
pub fn manual_clock() -> (Arc<ManualClock>, Arc<dyn Clock>) {
    let clock = Arc::new(ManualClock::new(100.0));
    let shared: Arc<dyn Clock> = clock.clone();
    (clock, shared)
}

/// Polls `condition` every millisecond until it holds or `timeout` passes.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    condition()
}

/// Moves `clock` forward and waits until the loop has run one full
/// iteration that observed the new time.
pub fn advance_and_settle(clock: &ManualClock, diagnostics: &Diagnostics, seconds: f64) {
    let ticks = diagnostics.ticks();
    clock.advance(seconds);
    wait_until(tolerances::WAIT, || diagnostics.ticks() >= ticks + 2);
}

/// [`advance_and_settle`] in `step`-second increments until `until`.
pub fn step_clock(clock: &ManualClock, diagnostics: &Diagnostics, until: f64, step: f64) {
    while until - clock.now() > 1e-9 {
        advance_and_settle(clock, diagnostics, step.min(until - clock.now()));
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
