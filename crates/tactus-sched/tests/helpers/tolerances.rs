//! Timing tolerances for scheduler tests.
//!
//! Dispatch can only happen on a loop tick, so anything tighter than one
//! resolution is meaningless. Real-clock tests also carry OS scheduling noise.

/// Manual-clock tests: an event may land up to this many ticks late.
pub const TICK_SLACK: f64 = 2.0;

/// Real-clock tests on a shared CI machine, in seconds.
pub const WALL_CLOCK_SLACK: f64 = 0.05;

/// How long a test waits for the worker before giving up.
pub const WAIT: std::time::Duration = std::time::Duration::from_secs(5);
