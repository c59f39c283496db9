//! Lock-free counters published by the scheduler loop.

use crate::jitter::JitterReport;
use arc_swap::ArcSwapOption;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct Diagnostics {
    ticks: AtomicU64,
    dispatched: AtomicU64,
    sink_failures: AtomicU64,
    discarded_on_stop: AtomicU64,
    last_jitter: ArcSwapOption<JitterReport>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loop iterations completed across all runs.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Events handed to the sink (including failed writes).
    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    /// Sink calls that returned an error.
    pub fn sink_failures(&self) -> u64 {
        self.sink_failures.load(Ordering::Relaxed)
    }

    pub fn discarded_on_stop(&self) -> u64 {
        self.discarded_on_stop.load(Ordering::Relaxed)
    }

    pub fn last_jitter(&self) -> Option<JitterReport> {
        self.last_jitter.load_full().map(|report| *report)
    }

    pub(crate) fn record_tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dispatched(&self, count: usize) {
        self.dispatched.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_sink_failure(&self) {
        self.sink_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_discarded(&self, count: usize) {
        self.discarded_on_stop
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub(crate) fn publish_jitter(&self, report: JitterReport) {
        self.last_jitter.store(Some(Arc::new(report)));
    }
}
