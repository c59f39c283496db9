//! Scheduler configuration.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tactus_midi::{status::CHANNELS, RawMessage};

/// What happens to events still pending when the scheduler stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FlushPolicy {
    /// Drop them. The count is logged and kept in diagnostics.
    #[default]
    Discard,
    /// Dispatch them all immediately, in due order, ignoring their due times.
    FastForward,
}

/// Safety messages written just before the sink is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SilencePolicy {
    Off,
    /// One All Notes Off (CC 123) per channel: 16 messages.
    #[default]
    AllNotesOff,
    /// All Sound Off (CC 120) and Reset All Controllers (CC 121) per
    /// channel: 32 messages.
    Panic,
}

impl SilencePolicy {
    pub fn messages(&self) -> Vec<RawMessage> {
        match self {
            SilencePolicy::Off => Vec::new(),
            SilencePolicy::AllNotesOff => (0..CHANNELS).map(RawMessage::all_notes_off).collect(),
            SilencePolicy::Panic => (0..CHANNELS)
                .flat_map(|ch| {
                    [
                        RawMessage::all_sound_off(ch),
                        RawMessage::reset_all_controllers(ch),
                    ]
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub bpm: f64,
    /// Ticks per quarter note. Fixed for the scheduler's lifetime.
    pub ppqn: u32,
    /// Maximum events drained from the intake per iteration.
    pub batch_size: usize,
    /// `None` for an unbounded intake.
    pub intake_capacity: Option<usize>,
    /// How long `send()` may block on a full bounded intake.
    pub send_timeout: Option<Duration>,
    pub flush_policy: FlushPolicy,
    pub silence_policy: SilencePolicy,
    /// Dispatches per jitter report; `None` disables the monitor.
    pub jitter_window: Option<usize>,
    /// Used by `stop_default()` and on drop.
    pub stop_timeout: Duration,
    pub thread_name: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            bpm: 120.0,
            ppqn: 480,
            batch_size: 100,
            intake_capacity: None,
            send_timeout: None,
            flush_policy: FlushPolicy::default(),
            silence_policy: SilencePolicy::default(),
            jitter_window: Some(100),
            stop_timeout: Duration::from_secs(5),
            thread_name: "tactus-scheduler".to_string(),
        }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.bpm.is_finite() && self.bpm > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "bpm must be positive, got {}",
                self.bpm
            )));
        }
        if self.ppqn == 0 {
            return Err(Error::InvalidConfig("ppqn must be greater than 0".into()));
        }
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig(
                "batch_size must be greater than 0".into(),
            ));
        }
        if self.intake_capacity == Some(0) {
            return Err(Error::InvalidConfig(
                "intake_capacity must be greater than 0".into(),
            ));
        }
        if self.jitter_window == Some(0) {
            return Err(Error::InvalidConfig(
                "jitter_window must be greater than 0".into(),
            ));
        }
        if self.thread_name.contains('\0') {
            return Err(Error::InvalidConfig(
                "thread_name must not contain NUL bytes".into(),
            ));
        }
        Ok(())
    }
}
