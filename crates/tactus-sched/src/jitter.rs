//! Dispatch jitter statistics.

use serde::{Deserialize, Serialize};

/// Summary of `dispatch_time - due_time` over one window, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JitterReport {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

/// Accumulates deviations and emits a [`JitterReport`] every `window`
/// dispatches, then starts over.
#[derive(Debug, Clone)]
pub struct JitterMonitor {
    window: usize,
    count: usize,
    sum: f64,
    min: f64,
    max: f64,
}

impl JitterMonitor {
    pub fn new(window: usize) -> Self {
        debug_assert!(window > 0);
        Self {
            window: window.max(1),
            count: 0,
            sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    pub fn record(&mut self, deviation: f64) -> Option<JitterReport> {
        self.count += 1;
        self.sum += deviation;
        self.min = self.min.min(deviation);
        self.max = self.max.max(deviation);

        if self.count < self.window {
            return None;
        }

        let report = JitterReport {
            count: self.count,
            mean: self.sum / self.count as f64,
            min: self.min,
            max: self.max,
        };
        self.reset();
        Some(report)
    }

    pub fn reset(&mut self) {
        self.count = 0;
        self.sum = 0.0;
        self.min = f64::INFINITY;
        self.max = f64::NEG_INFINITY;
    }

    pub fn window(&self) -> usize {
        self.window
    }
}
