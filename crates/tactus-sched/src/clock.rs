//! Monotonic time sources.
//!
//! All due times are absolute `f64` seconds on a [`Clock`]. Producers and the
//! scheduler loop read the same clock, so a due time computed at `send()` is
//! directly comparable to the loop's `now`.

use atomic_float::AtomicF64;
use std::sync::atomic::Ordering;
use std::time::Instant;

pub trait Clock: Send + Sync {
    /// Seconds since an arbitrary fixed origin. Must never go backwards.
    fn now(&self) -> f64;
}

/// [`Instant`]-backed clock. Origin is the moment of construction.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Clock that only moves when told to. Share it via `Arc`.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicF64,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self {
            now: AtomicF64::new(start),
        }
    }

    /// Moves the clock forward; negative steps are ignored.
    pub fn advance(&self, seconds: f64) {
        if seconds > 0.0 {
            self.now.fetch_add(seconds, Ordering::AcqRel);
        }
    }

    /// Jumps to `seconds` if that is not earlier than the current time.
    pub fn set(&self, seconds: f64) {
        self.now.fetch_max(seconds, Ordering::AcqRel);
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now(&self) -> f64 {
        self.now.load(Ordering::Acquire)
    }
}
