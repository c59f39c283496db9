//! Scheduler builder.

use std::sync::Arc;
use std::time::Duration;

use super::config::{FlushPolicy, SchedulerConfig, SilencePolicy};
use super::worker::{OpenerWorker, ThreadWorker, Worker};
use super::{Scheduler, Shared};
use crate::clock::{Clock, MonotonicClock};
use crate::error::{Error, Result};
use crate::intake::intake_channel;
use crate::sink::{Sink, SinkError, SinkOpener};
use crate::tempo::{Tempo, TempoController};

enum SinkSource {
    Open(Box<dyn Sink + Send>),
    Opener(SinkOpener),
}

#[derive(Default)]
pub struct SchedulerBuilder {
    config: SchedulerConfig,
    sink: Option<SinkSource>,
    clock: Option<Arc<dyn Clock>>,
}

impl SchedulerBuilder {
    /// Replaces every config field at once.
    pub fn config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn bpm(mut self, bpm: f64) -> Self {
        self.config.bpm = bpm;
        self
    }

    pub fn ppqn(mut self, ppqn: u32) -> Self {
        self.config.ppqn = ppqn;
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    /// Bounds the intake. `send()` fails with `QueueFull` when it is full.
    pub fn intake_capacity(mut self, capacity: usize) -> Self {
        self.config.intake_capacity = Some(capacity);
        self
    }

    /// Lets `send()` block up to `timeout` on a full bounded intake.
    pub fn send_timeout(mut self, timeout: Duration) -> Self {
        self.config.send_timeout = Some(timeout);
        self
    }

    pub fn flush_policy(mut self, policy: FlushPolicy) -> Self {
        self.config.flush_policy = policy;
        self
    }

    pub fn silence_policy(mut self, policy: SilencePolicy) -> Self {
        self.config.silence_policy = policy;
        self
    }

    pub fn jitter_window(mut self, window: usize) -> Self {
        self.config.jitter_window = Some(window);
        self
    }

    pub fn without_jitter_monitor(mut self) -> Self {
        self.config.jitter_window = None;
        self
    }

    pub fn stop_timeout(mut self, timeout: Duration) -> Self {
        self.config.stop_timeout = timeout;
        self
    }

    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.config.thread_name = name.into();
        self
    }

    /// Time source for due times and loop pacing. Defaults to
    /// [`MonotonicClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// An already-open sink, moved into the worker thread. It is closed when
    /// the scheduler stops, so the scheduler can only be started once.
    pub fn sink<S: Sink + Send + 'static>(mut self, sink: S) -> Self {
        self.sink = Some(SinkSource::Open(Box::new(sink)));
        self
    }

    /// Opens the sink inside the worker on every `start()`.
    pub fn sink_opener<F>(mut self, opener: F) -> Self
    where
        F: FnMut() -> std::result::Result<Box<dyn Sink>, SinkError> + Send + 'static,
    {
        self.sink = Some(SinkSource::Opener(Box::new(opener)));
        self
    }

    pub fn build(self) -> Result<Scheduler> {
        self.config.validate()?;
        let worker: Box<dyn Worker> = match self.sink {
            Some(SinkSource::Open(sink)) => Box::new(ThreadWorker::new(sink)),
            Some(SinkSource::Opener(opener)) => Box::new(OpenerWorker::new(opener)),
            None => {
                return Err(Error::InvalidConfig(
                    "a sink or sink opener is required".into(),
                ))
            }
        };

        let tempo = TempoController::new(Tempo::new(self.config.bpm, self.config.ppqn)?);
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(MonotonicClock::new()));
        let shared = Arc::new(Shared::new(tempo, clock));
        let intake = intake_channel(self.config.intake_capacity, self.config.send_timeout);

        Ok(Scheduler::from_parts(self.config, shared, intake, worker))
    }
}
