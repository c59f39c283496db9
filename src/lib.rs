//! # Tactus - Timed MIDI Event Scheduler
//!
//! Sends MIDI messages at precise times from a single worker loop paced by
//! the current tempo.
//!
//! ## Architecture
//!
//! Tactus is an umbrella crate over:
//! - **tactus-midi** - MIDI 1.0 message types (validation, constructors, sysex)
//! - **tactus-sched** - The scheduler (intake, pending heap, tempo, worker loop)
//!
//! ## Quick Start
//!
//! ```ignore
//! use tactus::prelude::*;
//!
//! let mut scheduler = Scheduler::builder()
//!     .bpm(120.0)
//!     .sink(my_sink)
//!     .build()?;
//!
//! scheduler.start()?;
//! scheduler.send(RawMessage::note_on(0, 60, 100))?;
//! scheduler.send_after(RawMessage::note_off(0, 60, 0), 0.5)?;
//! scheduler.stop_default()?;
//! ```
//!
//! ## Feature Flags
//!
//! - `midi-io` - [`MidirSink`] hardware output

/// Re-export of tactus-midi for direct access
pub use tactus_midi as midi;

/// Re-export of tactus-sched for direct access
pub use tactus_sched as sched;

pub use tactus_midi::{parse_sysex_hex, status, MessageError, MessageKind, RawMessage};

pub use tactus_sched::{
    // Time
    Clock,
    ClockFollower,
    Diagnostics,
    FlushPolicy,
    JitterReport,
    ManualClock,
    MonotonicClock,
    // Scheduler
    Scheduler,
    SchedulerBuilder,
    SchedulerConfig,
    SchedulerHandle,
    SchedulerState,
    SilencePolicy,
    // Output
    Sink,
    SinkError,
    SinkOpener,
    Tempo,
    TempoController,
    WorkerKind,
};

#[cfg(feature = "midi-io")]
pub use tactus_sched::MidirSink;

mod error;
pub use error::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{Error, Result};

    pub use tactus_midi::RawMessage;
    pub use tactus_sched::{
        Clock, FlushPolicy, MonotonicClock, Scheduler, SchedulerHandle, SchedulerState,
        SilencePolicy, Sink, SinkError,
    };

    #[cfg(feature = "midi-io")]
    pub use tactus_sched::MidirSink;
}
