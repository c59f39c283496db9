//! Error types for MIDI message validation.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MessageError {
    #[error("empty MIDI message")]
    Empty,

    #[error("first byte {0:#04x} is not a status byte")]
    MissingStatus(u8),

    #[error("undefined status byte {0:#04x}")]
    UndefinedStatus(u8),

    #[error("status {status:#04x} expects {expected} bytes, got {actual}")]
    WrongLength {
        status: u8,
        expected: usize,
        actual: usize,
    },

    #[error("data byte {value:#04x} at index {index} has its top bit set")]
    DataOutOfRange { index: usize, value: u8 },

    #[error("system exclusive message is not terminated by 0xF7")]
    UnterminatedSysex,

    #[error("invalid sysex hex string: {0}")]
    InvalidHex(String),
}

pub type Result<T> = std::result::Result<T, MessageError>;
