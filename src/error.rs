//! Centralized error type for the tactus umbrella crate.
//!
//! Wraps the subsystem errors so `?` propagates across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Scheduler(#[from] tactus_sched::Error),

    #[error("MIDI: {0}")]
    Message(#[from] tactus_midi::MessageError),

    #[error("Sink: {0}")]
    Sink(#[from] tactus_sched::SinkError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
