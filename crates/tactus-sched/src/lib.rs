//! Timed MIDI event scheduler.
//!
//! Accepts time-tagged MIDI messages from any number of producer threads and
//! writes them to a [`Sink`] when they fall due, from a single worker loop
//! paced by the current tempo.
//!
//! - **Intake**: producers stamp a global sequence number and hand events to
//!   the worker over a crossbeam channel; nothing else is shared.
//! - **Ordering**: events leave in `(due time, submission order)` order.
//! - **Pacing**: the loop ticks every `60 / (bpm * ppqn)` seconds and
//!   subtracts the time spent working from each sleep.
//! - **Lifecycle**: `start()` spawns the worker, `stop()` drains, silences and
//!   closes the sink.
//!
//! Feature gates: `midi-io` (a [`MidirSink`] over a hardware output port).

pub mod error;
pub use error::{Error, Result};

pub mod clock;
pub use clock::{Clock, ManualClock, MonotonicClock};

pub mod sink;
pub use sink::{Sink, SinkError, SinkOpener};

mod event;
pub use event::TimedEvent;

mod heap;
pub use heap::PendingHeap;

pub mod intake;
pub use intake::{IntakeReceiver, IntakeSender};

pub mod tempo;
pub use tempo::{ClockFollower, Tempo, TempoController};

mod jitter;
pub use jitter::{JitterMonitor, JitterReport};

mod diagnostics;
pub use diagnostics::Diagnostics;

mod scheduler;
pub use scheduler::{
    FlushPolicy, Scheduler, SchedulerBuilder, SchedulerConfig, SchedulerHandle, SchedulerState,
    SilencePolicy, WorkerKind,
};

#[cfg(feature = "midi-io")]
pub(crate) mod io;

#[cfg(feature = "midi-io")]
pub use io::MidirSink;

pub use tactus_midi::{MessageError, MessageKind, RawMessage};
