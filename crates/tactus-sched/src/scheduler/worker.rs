//! Worker implementations that host the scheduler loop.
//!
//! Both run the loop on a dedicated named thread and differ only in where the
//! sink comes from:
//! - [`ThreadWorker`] is handed an open, `Send` sink and moves it into the
//!   thread. The sink is closed on stop, so this worker runs once.
//! - [`OpenerWorker`] calls a [`SinkOpener`] inside the thread on every start.
//!   The sink never crosses threads and the worker can be restarted.

use super::run_loop::{SchedulerLoop, WorkerContext};
use crate::error::{Error, Result};
use crate::sink::{Sink, SinkOpener};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerKind {
    /// Sink handed over already open.
    Thread,
    /// Sink opened inside the worker.
    Opener,
}

pub(crate) trait Worker: Send {
    fn kind(&self) -> WorkerKind;

    fn start(&mut self, ctx: WorkerContext) -> Result<()>;

    /// Waits up to `timeout` for the loop to report finished, then joins it.
    /// Shutdown must already have been requested.
    fn stop(&mut self, timeout: Duration) -> Result<()>;

    /// True until a started worker has been joined.
    fn is_alive(&self) -> bool;
}

struct RunningWorker {
    handle: JoinHandle<()>,
    finished: Receiver<()>,
}

impl RunningWorker {
    fn spawn(name: &str, body: impl FnOnce() + Send + 'static) -> Result<Self> {
        let (done_tx, finished) = bounded(1);
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                body();
                let _ = done_tx.send(());
            })
            .map_err(Error::WorkerSpawn)?;
        Ok(Self { handle, finished })
    }
}

fn wait_finished(slot: &mut Option<RunningWorker>, timeout: Duration) -> Result<()> {
    let Some(running) = slot.as_ref() else {
        return Ok(());
    };

    match running.finished.recv_timeout(timeout) {
        // Disconnected: the loop panicked and dropped the sender
        Ok(()) | Err(RecvTimeoutError::Disconnected) => {}
        Err(RecvTimeoutError::Timeout) => return Err(Error::StopTimeout(timeout)),
    }

    match slot.take().map(|running| running.handle.join()) {
        Some(Err(_)) => {
            error!("scheduler worker panicked");
            Err(Error::WorkerPanicked)
        }
        _ => Ok(()),
    }
}

type SinkSlot = Arc<Mutex<Option<Box<dyn Sink + Send>>>>;

pub(crate) struct ThreadWorker {
    /// Emptied by the thread once it is running, so a failed spawn leaves
    /// the sink in place for the next `start()`.
    sink: SinkSlot,
    running: Option<RunningWorker>,
}

impl ThreadWorker {
    pub(crate) fn new(sink: Box<dyn Sink + Send>) -> Self {
        Self {
            sink: Arc::new(Mutex::new(Some(sink))),
            running: None,
        }
    }
}

impl Worker for ThreadWorker {
    fn kind(&self) -> WorkerKind {
        WorkerKind::Thread
    }

    fn start(&mut self, ctx: WorkerContext) -> Result<()> {
        if self.sink.lock().is_none() {
            return Err(Error::SinkConsumed);
        }
        let slot = Arc::clone(&self.sink);
        let name = ctx.thread_name.clone();
        self.running = Some(RunningWorker::spawn(&name, move || {
            let sink = slot.lock().take();
            match sink {
                Some(sink) => SchedulerLoop::new(sink, ctx).run(),
                None => ctx.shared.mark_stopped(),
            }
        })?);
        Ok(())
    }

    fn stop(&mut self, timeout: Duration) -> Result<()> {
        wait_finished(&mut self.running, timeout)
    }

    fn is_alive(&self) -> bool {
        self.running.is_some()
    }
}

pub(crate) struct OpenerWorker {
    opener: Arc<Mutex<SinkOpener>>,
    running: Option<RunningWorker>,
}

impl OpenerWorker {
    pub(crate) fn new(opener: SinkOpener) -> Self {
        Self {
            opener: Arc::new(Mutex::new(opener)),
            running: None,
        }
    }
}

impl Worker for OpenerWorker {
    fn kind(&self) -> WorkerKind {
        WorkerKind::Opener
    }

    fn start(&mut self, ctx: WorkerContext) -> Result<()> {
        let opener = Arc::clone(&self.opener);
        let name = ctx.thread_name.clone();
        self.running = Some(RunningWorker::spawn(&name, move || {
            let opened = {
                let mut open = opener.lock();
                (&mut *open)()
            };
            match opened {
                Ok(sink) => SchedulerLoop::new(sink, ctx).run(),
                Err(e) => {
                    error!(error = %e, "failed to open sink in scheduler worker");
                    ctx.shared.mark_stopped();
                    let discarded = ctx.intake.discard_all();
                    if discarded > 0 {
                        ctx.shared.diagnostics.record_discarded(discarded);
                    }
                }
            }
        })?);
        Ok(())
    }

    fn stop(&mut self, timeout: Duration) -> Result<()> {
        wait_finished(&mut self.running, timeout)
    }

    fn is_alive(&self) -> bool {
        self.running.is_some()
    }
}
