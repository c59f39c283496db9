//! Timed event scheduler: the public entry point.
//!
//! ## Quick Start
//!
//! ```ignore
//! use tactus_sched::{RawMessage, Scheduler};
//!
//! let mut scheduler = Scheduler::builder()
//!     .bpm(120.0)
//!     .ppqn(480)
//!     .sink(my_sink)
//!     .build()?;
//!
//! scheduler.start()?;
//! scheduler.send(RawMessage::note_on(0, 60, 100))?;
//! scheduler.send_after(RawMessage::note_off(0, 60, 0), 0.5)?;
//!
//! // Producers on other threads get a cheap handle
//! let handle = scheduler.handle();
//! std::thread::spawn(move || handle.send(RawMessage::timing_clock()));
//!
//! scheduler.stop(std::time::Duration::from_secs(5))?;
//! ```

mod builder;
pub(crate) mod config;
pub(crate) mod run_loop;
pub(crate) mod worker;

pub use builder::SchedulerBuilder;
pub use config::{FlushPolicy, SchedulerConfig, SilencePolicy};
pub use worker::WorkerKind;

use crate::clock::Clock;
use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::intake::{IntakeReceiver, IntakeSender};
use crate::tempo::TempoController;
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::RwLock;
use run_loop::{LoopOptions, WorkerContext};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tactus_midi::RawMessage;
use tracing::{debug, warn};
use worker::Worker;

/// Lifecycle of one scheduler instance.
///
/// `Stopped --start()--> Running --stop()--> Draining --(flush, close)--> Stopped`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SchedulerState {
    Stopped = 0,
    Running = 1,
    Draining = 2,
}

impl SchedulerState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => SchedulerState::Running,
            2 => SchedulerState::Draining,
            _ => SchedulerState::Stopped,
        }
    }
}

/// State shared between the facade, producer handles and the loop.
pub(crate) struct Shared {
    state: AtomicU8,
    /// Held shared across a producer's state check and submit, and
    /// exclusively while `stop()` leaves `Running`.
    gate: RwLock<()>,
    shutdown: AtomicBool,
    wake_tx: Sender<()>,
    wake_rx: Receiver<()>,
    pub(crate) tempo: TempoController,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) diagnostics: Arc<Diagnostics>,
}

impl Shared {
    pub(crate) fn new(tempo: TempoController, clock: Arc<dyn Clock>) -> Self {
        let (wake_tx, wake_rx) = bounded(1);
        Self {
            state: AtomicU8::new(SchedulerState::Stopped as u8),
            gate: RwLock::new(()),
            shutdown: AtomicBool::new(false),
            wake_tx,
            wake_rx,
            tempo,
            clock,
            diagnostics: Arc::new(Diagnostics::new()),
        }
    }

    #[inline]
    pub(crate) fn state(&self) -> SchedulerState {
        SchedulerState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: SchedulerState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Called by a worker whose loop could not start.
    pub(crate) fn mark_stopped(&self) {
        let _gate = self.gate.write();
        self.set_state(SchedulerState::Stopped);
    }

    #[inline]
    pub(crate) fn shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
        let _ = self.wake_tx.try_send(());
    }

    fn reset_shutdown(&self) {
        while self.wake_rx.try_recv().is_ok() {}
        self.shutdown.store(false, Ordering::Release);
    }

    /// Sleeps for `duration` unless shutdown is requested first.
    pub(crate) fn sleep(&self, duration: Duration) {
        let _ = self.wake_rx.recv_timeout(duration);
    }
}

/// Producer handle. Clone it into any thread or input callback; every send
/// goes through the scheduler's intake.
#[derive(Clone)]
pub struct SchedulerHandle {
    shared: Arc<Shared>,
    intake: IntakeSender,
}

impl SchedulerHandle {
    /// Enqueues `message` due at `time + delta` seconds on the scheduler
    /// clock. `time: None` means now.
    pub fn schedule(&self, message: RawMessage, time: Option<f64>, delta: f64) -> Result<()> {
        // An accepted event must reach the intake before the loop's final drain
        let _gate = self.shared.gate.read();
        if self.shared.state() != SchedulerState::Running {
            return Err(Error::Closed);
        }
        let due = time.unwrap_or_else(|| self.shared.clock.now()) + delta;
        if !due.is_finite() {
            return Err(Error::InvalidTime(due));
        }
        self.intake.submit(due, message)
    }

    /// Dispatch on the next loop iteration.
    pub fn send(&self, message: RawMessage) -> Result<()> {
        self.schedule(message, None, 0.0)
    }

    /// Dispatch at an absolute clock time, in seconds.
    pub fn send_at(&self, message: RawMessage, time: f64) -> Result<()> {
        self.schedule(message, Some(time), 0.0)
    }

    /// Dispatch `delta` seconds from now.
    pub fn send_after(&self, message: RawMessage, delta: f64) -> Result<()> {
        self.schedule(message, None, delta)
    }

    /// Validates raw bytes and sends them immediately.
    pub fn send_bytes(&self, bytes: impl AsRef<[u8]>) -> Result<()> {
        self.send(RawMessage::new(bytes)?)
    }

    pub fn now(&self) -> f64 {
        self.shared.clock.now()
    }

    /// Events submitted but not yet picked up by the loop.
    pub fn queued(&self) -> usize {
        self.intake.queued()
    }

    pub fn state(&self) -> SchedulerState {
        self.shared.state()
    }

    pub fn bpm(&self) -> f64 {
        self.shared.tempo.bpm()
    }

    /// Takes effect from the next loop iteration. Pending due times are
    /// unaffected.
    pub fn set_bpm(&self, bpm: f64) -> Result<()> {
        self.shared.tempo.set_bpm(bpm)
    }
}

/// Owns the worker and the consumer end of the intake.
pub struct Scheduler {
    handle: SchedulerHandle,
    intake: IntakeReceiver,
    worker: Box<dyn Worker>,
    options: LoopOptions,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn builder() -> SchedulerBuilder {
        SchedulerBuilder::default()
    }

    pub(crate) fn from_parts(
        config: SchedulerConfig,
        shared: Arc<Shared>,
        intake: (IntakeSender, IntakeReceiver),
        worker: Box<dyn Worker>,
    ) -> Self {
        let options = LoopOptions {
            batch_size: config.batch_size,
            flush_policy: config.flush_policy,
            silence_policy: config.silence_policy,
            jitter_window: config.jitter_window,
        };
        Self {
            handle: SchedulerHandle {
                shared,
                intake: intake.0,
            },
            intake: intake.1,
            worker,
            options,
            config,
        }
    }

    #[inline]
    fn shared(&self) -> &Arc<Shared> {
        &self.handle.shared
    }

    /// Spawns the worker. No-op if already running.
    pub fn start(&mut self) -> Result<()> {
        if self.state() == SchedulerState::Running {
            return Ok(());
        }
        // Reap a worker left behind by a stop that timed out
        if self.worker.is_alive() {
            self.worker.stop(Duration::ZERO)?;
        }

        let stale = self.intake.discard_all();
        if stale > 0 {
            debug!(stale, "dropped events submitted during previous shutdown");
        }

        let shared = Arc::clone(self.shared());
        shared.reset_shutdown();
        shared.set_state(SchedulerState::Running);

        let ctx = WorkerContext {
            shared: Arc::clone(&shared),
            intake: self.intake.clone(),
            options: self.options,
            thread_name: self.config.thread_name.clone(),
        };
        if let Err(e) = self.worker.start(ctx) {
            shared.set_state(SchedulerState::Stopped);
            return Err(e);
        }

        debug!(
            worker = ?self.worker.kind(),
            bpm = self.bpm(),
            ppqn = self.ppqn(),
            "scheduler started"
        );
        Ok(())
    }

    /// Stops intake, lets the loop flush and silence the sink, and waits up
    /// to `timeout` for it to finish. Idempotent.
    ///
    /// On [`Error::StopTimeout`] the scheduler stays `Draining`; call `stop`
    /// again to keep waiting, or drop the scheduler to detach the worker.
    /// [`Error::WorkerPanicked`] still leaves it `Stopped`.
    pub fn stop(&mut self, timeout: Duration) -> Result<()> {
        if self.state() == SchedulerState::Stopped && !self.worker.is_alive() {
            return Ok(());
        }

        let shared = Arc::clone(self.shared());
        {
            let _gate = shared.gate.write();
            shared.set_state(SchedulerState::Draining);
        }
        shared.request_shutdown();

        match self.worker.stop(timeout) {
            Err(e @ Error::StopTimeout(_)) => Err(e),
            result => {
                shared.set_state(SchedulerState::Stopped);
                debug!("scheduler stopped");
                result
            }
        }
    }

    /// [`Scheduler::stop`] with the configured `stop_timeout`.
    pub fn stop_default(&mut self) -> Result<()> {
        self.stop(self.config.stop_timeout)
    }

    pub fn state(&self) -> SchedulerState {
        self.shared().state()
    }

    pub fn handle(&self) -> SchedulerHandle {
        self.handle.clone()
    }

    pub fn schedule(&self, message: RawMessage, time: Option<f64>, delta: f64) -> Result<()> {
        self.handle.schedule(message, time, delta)
    }

    pub fn send(&self, message: RawMessage) -> Result<()> {
        self.handle.send(message)
    }

    pub fn send_at(&self, message: RawMessage, time: f64) -> Result<()> {
        self.handle.send_at(message, time)
    }

    pub fn send_after(&self, message: RawMessage, delta: f64) -> Result<()> {
        self.handle.send_after(message, delta)
    }

    pub fn send_bytes(&self, bytes: impl AsRef<[u8]>) -> Result<()> {
        self.handle.send_bytes(bytes)
    }

    pub fn now(&self) -> f64 {
        self.handle.now()
    }

    pub fn queued(&self) -> usize {
        self.handle.queued()
    }

    pub fn bpm(&self) -> f64 {
        self.handle.bpm()
    }

    pub fn set_bpm(&self, bpm: f64) -> Result<()> {
        self.handle.set_bpm(bpm)
    }

    pub fn ppqn(&self) -> u32 {
        self.shared().tempo.ppqn()
    }

    /// Current loop tick length.
    pub fn resolution(&self) -> Duration {
        self.shared().tempo.load().resolution()
    }

    pub fn tempo(&self) -> &TempoController {
        &self.shared().tempo
    }

    pub fn diagnostics(&self) -> Arc<Diagnostics> {
        Arc::clone(&self.shared().diagnostics)
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn worker_kind(&self) -> WorkerKind {
        self.worker.kind()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if let Err(e) = self.stop(self.config.stop_timeout) {
            warn!(error = %e, "scheduler did not stop cleanly at drop");
        }
    }
}
