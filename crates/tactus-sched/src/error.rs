//! Error types for the scheduler.

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("scheduler is not running")]
    Closed,

    #[error("intake queue is full")]
    QueueFull,

    #[error("invalid tempo: {0} bpm")]
    InvalidTempo(f64),

    #[error("invalid due time: {0}")]
    InvalidTime(f64),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("sink was closed by a previous stop and cannot be reused")]
    SinkConsumed,

    #[error("failed to spawn scheduler worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    #[error("scheduler worker did not finish within {0:?}")]
    StopTimeout(Duration),

    #[error("scheduler worker panicked before closing the sink")]
    WorkerPanicked,

    #[error("invalid MIDI message: {0}")]
    Message(#[from] tactus_midi::MessageError),
}

pub type Result<T> = std::result::Result<T, Error>;
