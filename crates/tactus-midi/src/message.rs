//! Validated raw MIDI messages.

use crate::error::{MessageError, Result};
use crate::status::{self, message_length};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Broad class of a [`RawMessage`], decided by its status byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Channel,
    SystemCommon,
    RealTime,
    SystemExclusive,
}

/// One complete MIDI 1.0 message as it appears on the wire.
///
/// Construction validates framing, so a `RawMessage` is always well formed:
/// a status byte, the exact number of 7-bit data bytes for that status, or a
/// `0xF0 .. 0xF7` sysex block with 7-bit contents. Channel and system messages
/// fit the inline buffer and never allocate.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct RawMessage {
    bytes: SmallVec<[u8; 3]>,
}

impl RawMessage {
    pub fn new(bytes: impl AsRef<[u8]>) -> Result<Self> {
        let bytes = bytes.as_ref();
        validate(bytes)?;
        Ok(Self::from_valid(bytes))
    }

    /// Validating constructor restricted to system exclusive blocks.
    pub fn sysex(bytes: impl AsRef<[u8]>) -> Result<Self> {
        let bytes = bytes.as_ref();
        match bytes.first() {
            None => Err(MessageError::Empty),
            Some(&status::SYSTEM_EXCLUSIVE) => Self::new(bytes),
            Some(_) => Err(MessageError::UnterminatedSysex),
        }
    }

    #[inline]
    fn from_valid(bytes: &[u8]) -> Self {
        debug_assert!(validate(bytes).is_ok(), "invalid MIDI bytes {:02X?}", bytes);
        Self {
            bytes: SmallVec::from_slice(bytes),
        }
    }

    #[inline]
    fn channel_message(status: u8, channel: u8, data: &[u8]) -> Self {
        let mut bytes: SmallVec<[u8; 3]> = SmallVec::new();
        bytes.push(status | channel.min(15)); // MIDI channels are 0-15
        bytes.extend(data.iter().map(|b| b & 0x7F));
        Self::from_valid(&bytes)
    }

    pub fn note_on(channel: u8, note: u8, velocity: u8) -> Self {
        Self::channel_message(status::NOTE_ON, channel, &[note, velocity])
    }

    pub fn note_off(channel: u8, note: u8, velocity: u8) -> Self {
        Self::channel_message(status::NOTE_OFF, channel, &[note, velocity])
    }

    pub fn poly_pressure(channel: u8, note: u8, pressure: u8) -> Self {
        Self::channel_message(status::POLY_PRESSURE, channel, &[note, pressure])
    }

    pub fn control_change(channel: u8, controller: u8, value: u8) -> Self {
        Self::channel_message(status::CONTROL_CHANGE, channel, &[controller, value])
    }

    pub fn program_change(channel: u8, program: u8) -> Self {
        Self::channel_message(status::PROGRAM_CHANGE, channel, &[program])
    }

    pub fn channel_pressure(channel: u8, pressure: u8) -> Self {
        Self::channel_message(status::CHANNEL_PRESSURE, channel, &[pressure])
    }

    /// `value`: signed 14-bit (-8192 to 8191), clamped.
    pub fn pitch_bend(channel: u8, value: i16) -> Self {
        let unsigned = (value as i32 + 8192).clamp(0, 16383) as u16;
        let lsb = (unsigned & 0x7F) as u8;
        let msb = ((unsigned >> 7) & 0x7F) as u8;
        Self::channel_message(status::PITCH_BEND, channel, &[lsb, msb])
    }

    pub fn all_notes_off(channel: u8) -> Self {
        Self::control_change(channel, status::ALL_NOTES_OFF, 0)
    }

    pub fn all_sound_off(channel: u8) -> Self {
        Self::control_change(channel, status::ALL_SOUND_OFF, 0)
    }

    pub fn reset_all_controllers(channel: u8) -> Self {
        Self::control_change(channel, status::RESET_ALL_CONTROLLERS, 0)
    }

    pub fn local_control(channel: u8, on: bool) -> Self {
        Self::control_change(channel, status::LOCAL_CONTROL, if on { 127 } else { 0 })
    }

    /// Registered parameter change: parameter select (CC 101/100) followed by
    /// data entry (CC 6/38). Both `param` and `value` are 14-bit.
    pub fn rpn(channel: u8, param: u16, value: u16) -> Vec<Self> {
        Self::parameter_change(channel, status::RPN_MSB, status::RPN_LSB, param, value)
    }

    /// Non-registered parameter change (CC 99/98, then CC 6/38).
    pub fn nrpn(channel: u8, param: u16, value: u16) -> Vec<Self> {
        Self::parameter_change(channel, status::NRPN_MSB, status::NRPN_LSB, param, value)
    }

    fn parameter_change(channel: u8, msb_cc: u8, lsb_cc: u8, param: u16, value: u16) -> Vec<Self> {
        vec![
            Self::control_change(channel, msb_cc, (param >> 7) as u8),
            Self::control_change(channel, lsb_cc, param as u8),
            Self::control_change(channel, status::DATA_ENTRY_MSB, (value >> 7) as u8),
            Self::control_change(channel, status::DATA_ENTRY_LSB, value as u8),
        ]
    }

    pub fn timing_clock() -> Self {
        Self::from_valid(&[status::TIMING_CLOCK])
    }

    pub fn start() -> Self {
        Self::from_valid(&[status::SONG_START])
    }

    pub fn continue_() -> Self {
        Self::from_valid(&[status::SONG_CONTINUE])
    }

    pub fn stop() -> Self {
        Self::from_valid(&[status::SONG_STOP])
    }

    /// `beats`: 14-bit count of sixteenth notes since song start.
    pub fn song_position(beats: u16) -> Self {
        let beats = beats.min(0x3FFF);
        Self::from_valid(&[
            status::SONG_POSITION_POINTER,
            (beats & 0x7F) as u8,
            (beats >> 7) as u8,
        ])
    }

    pub fn song_select(song: u8) -> Self {
        Self::from_valid(&[status::SONG_SELECT, song & 0x7F])
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false; kept for clippy's `len_without_is_empty`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[inline]
    pub fn status(&self) -> u8 {
        self.bytes[0]
    }

    /// Channel 0-15 for channel voice/mode messages.
    #[inline]
    pub fn channel(&self) -> Option<u8> {
        match self.kind() {
            MessageKind::Channel => Some(self.status() & 0x0F),
            _ => None,
        }
    }

    pub fn kind(&self) -> MessageKind {
        match self.status() {
            status::SYSTEM_EXCLUSIVE => MessageKind::SystemExclusive,
            0xF8..=0xFF => MessageKind::RealTime,
            0xF1..=0xF7 => MessageKind::SystemCommon,
            _ => MessageKind::Channel,
        }
    }

    #[inline]
    pub fn is_sysex(&self) -> bool {
        self.status() == status::SYSTEM_EXCLUSIVE
    }
}

impl std::fmt::Debug for RawMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RawMessage({:02X?})", self.as_bytes())
    }
}

impl AsRef<[u8]> for RawMessage {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl TryFrom<Vec<u8>> for RawMessage {
    type Error = MessageError;

    fn try_from(bytes: Vec<u8>) -> Result<Self> {
        Self::new(bytes)
    }
}

impl TryFrom<&[u8]> for RawMessage {
    type Error = MessageError;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        Self::new(bytes)
    }
}

impl From<RawMessage> for Vec<u8> {
    fn from(message: RawMessage) -> Self {
        message.bytes.into_vec()
    }
}

fn validate(bytes: &[u8]) -> Result<()> {
    let (&status_byte, _) = bytes.split_first().ok_or(MessageError::Empty)?;
    if status_byte & 0x80 == 0 {
        return Err(MessageError::MissingStatus(status_byte));
    }

    if status_byte == status::SYSTEM_EXCLUSIVE {
        if bytes.len() < 2 || bytes[bytes.len() - 1] != status::END_OF_EXCLUSIVE {
            return Err(MessageError::UnterminatedSysex);
        }
        return check_data(&bytes[..bytes.len() - 1]);
    }

    let expected = message_length(status_byte).ok_or(MessageError::UndefinedStatus(status_byte))?;
    if bytes.len() != expected {
        return Err(MessageError::WrongLength {
            status: status_byte,
            expected,
            actual: bytes.len(),
        });
    }
    check_data(bytes)
}

/// Checks every byte after the status byte.
fn check_data(bytes: &[u8]) -> Result<()> {
    match bytes.iter().enumerate().skip(1).find(|(_, b)| **b & 0x80 != 0) {
        Some((index, &value)) => Err(MessageError::DataOutOfRange { index, value }),
        None => Ok(()),
    }
}
