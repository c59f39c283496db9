//! MIDI 1.0 wire-format types for the Tactus scheduler.
//!
//! Every payload the scheduler moves is a [`RawMessage`]: an immutable byte
//! sequence that has already been checked against the MIDI 1.0 framing rules
//! (status byte, data byte range, message length, sysex delimiters).
//!
//! # Example
//!
//! ```
//! use tactus_midi::{status, RawMessage};
//!
//! let on = RawMessage::note_on(0, 60, 100);
//! assert_eq!(on.as_bytes(), &[status::NOTE_ON, 60, 100]);
//!
//! let sysex = tactus_midi::parse_sysex_hex("F0 7E 7F 06 01 F7").unwrap();
//! assert!(sysex.is_sysex());
//! ```

pub mod error;
pub use error::{MessageError, Result};

pub mod status;

mod message;
pub use message::{MessageKind, RawMessage};

mod sysex;
pub use sysex::parse_sysex_hex;
