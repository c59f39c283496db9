//! Output capability the scheduler writes to.
//!
//! The scheduler never opens or enumerates devices. It is handed a [`Sink`]
//! (or a [`SinkOpener`] that builds one inside the worker) and only ever
//! calls the three methods below.

use tactus_midi::RawMessage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("sink write failed: {0}")]
    Write(String),

    #[error("sink is closed")]
    Closed,

    #[error("failed to open sink: {0}")]
    Open(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub trait Sink {
    /// Writes channel and system messages, in order, as one call.
    fn send(&mut self, batch: &[RawMessage]) -> Result<(), SinkError>;

    /// Writes one complete `0xF0 .. 0xF7` block on its own.
    fn send_sysex(&mut self, message: &RawMessage) -> Result<(), SinkError>;

    fn close(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn send(&mut self, batch: &[RawMessage]) -> Result<(), SinkError> {
        (**self).send(batch)
    }

    fn send_sysex(&mut self, message: &RawMessage) -> Result<(), SinkError> {
        (**self).send_sysex(message)
    }

    fn close(&mut self) -> Result<(), SinkError> {
        (**self).close()
    }
}

/// Builds a sink from inside the worker thread. Called once per `start()`,
/// so the produced sink does not need to be `Send`.
pub type SinkOpener = Box<dyn FnMut() -> Result<Box<dyn Sink>, SinkError> + Send>;
