//! Tempo and tick resolution.
//!
//! The loop sleeps one tick per iteration, `60 / (bpm * ppqn)` seconds. The
//! `(bpm, ppqn)` pair lives in an [`ArcSwap`] slot: setters publish a whole
//! new value, the loop loads it once per iteration, and nobody blocks.
//!
//! Tempo only affects loop cadence. Due times are absolute clock instants,
//! so events already pending are never rebased by a tempo change.

use crate::error::{Error, Result};
use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tactus_midi::{status, RawMessage};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tempo {
    bpm: f64,
    ppqn: u32,
}

impl Tempo {
    pub fn new(bpm: f64, ppqn: u32) -> Result<Self> {
        validate_bpm(bpm)?;
        if ppqn == 0 {
            return Err(Error::InvalidConfig("ppqn must be greater than 0".into()));
        }
        Ok(Self { bpm, ppqn })
    }

    #[inline]
    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    #[inline]
    pub fn ppqn(&self) -> u32 {
        self.ppqn
    }

    /// Seconds per tick.
    #[inline]
    pub fn resolution_secs(&self) -> f64 {
        60.0 / (self.bpm * self.ppqn as f64)
    }

    /// Saturates at [`Duration::MAX`] for tempos too slow to represent.
    pub fn resolution(&self) -> Duration {
        saturating_duration(self.resolution_secs())
    }
}

pub(crate) fn saturating_duration(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

fn validate_bpm(bpm: f64) -> Result<()> {
    if bpm.is_finite() && bpm > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidTempo(bpm))
    }
}

/// Shared tempo slot read by the scheduler loop.
#[derive(Debug)]
pub struct TempoController {
    current: ArcSwap<Tempo>,
}

impl TempoController {
    pub fn new(tempo: Tempo) -> Self {
        Self {
            current: ArcSwap::from_pointee(tempo),
        }
    }

    #[inline]
    pub fn load(&self) -> Tempo {
        **self.current.load()
    }

    pub fn bpm(&self) -> f64 {
        self.load().bpm
    }

    pub fn ppqn(&self) -> u32 {
        self.load().ppqn
    }

    #[inline]
    pub fn resolution_secs(&self) -> f64 {
        self.load().resolution_secs()
    }

    /// Rejects non-positive or non-finite values and keeps the old tempo.
    /// `ppqn` is fixed at construction.
    pub fn set_bpm(&self, bpm: f64) -> Result<()> {
        validate_bpm(bpm)?;
        let ppqn = self.ppqn();
        self.current.store(Arc::new(Tempo { bpm, ppqn }));
        tracing::debug!(
            bpm,
            resolution_ms = 60_000.0 / (bpm * ppqn as f64),
            "tempo changed"
        );
        Ok(())
    }
}

/// MIDI timing clock messages per quarter note.
pub const CLOCKS_PER_QUARTER: usize = 24;

/// Estimates tempo from incoming MIDI timing clock (0xF8).
///
/// Keeps the intervals of the last quarter note and reports the BPM implied
/// by their mean. Start/Continue/Stop toggle [`ClockFollower::is_running`].
#[derive(Debug, Clone)]
pub struct ClockFollower {
    intervals: VecDeque<f64>,
    last_clock: Option<f64>,
    running: bool,
}

impl ClockFollower {
    pub fn new() -> Self {
        Self {
            intervals: VecDeque::with_capacity(CLOCKS_PER_QUARTER + 1),
            last_clock: None,
            running: true,
        }
    }

    /// Feeds one received message stamped with its arrival time in seconds.
    /// Messages other than clock and transport are ignored.
    pub fn process(&mut self, message: &RawMessage, timestamp: f64) {
        match message.status() {
            status::TIMING_CLOCK => {
                if let Some(last) = self.last_clock {
                    self.intervals.push_back(timestamp - last);
                    if self.intervals.len() > CLOCKS_PER_QUARTER {
                        self.intervals.pop_front();
                    }
                }
                self.last_clock = Some(timestamp);
            }
            status::SONG_START | status::SONG_CONTINUE => self.running = true,
            status::SONG_STOP => self.running = false,
            _ => {}
        }
    }

    /// `None` until at least two intervals were seen.
    pub fn bpm(&self) -> Option<f64> {
        if self.intervals.len() < 2 {
            return None;
        }
        let mean = self.intervals.iter().sum::<f64>() / self.intervals.len() as f64;
        (mean > 0.0).then(|| 60.0 / (mean * CLOCKS_PER_QUARTER as f64))
    }

    pub fn is_synced(&self) -> bool {
        self.bpm().is_some()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Pushes the current estimate into `tempo`. Returns whether it did.
    pub fn apply_to(&self, tempo: &TempoController) -> Result<bool> {
        match self.bpm() {
            Some(bpm) => tempo.set_bpm(bpm).map(|_| true),
            None => Ok(false),
        }
    }

    pub fn reset(&mut self) {
        self.intervals.clear();
        self.last_clock = None;
    }
}

impl Default for ClockFollower {
    fn default() -> Self {
        Self::new()
    }
}
