//! Hardware MIDI output via midir.
//!
//! Requires the `midi-io` feature.

mod midir_sink;

pub use midir_sink::MidirSink;
