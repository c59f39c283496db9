//! Status bytes and controller numbers.

// Channel voice (high nibble, OR with the channel)
pub const NOTE_OFF: u8 = 0x80;
pub const NOTE_ON: u8 = 0x90;
pub const POLY_PRESSURE: u8 = 0xA0;
pub const CONTROL_CHANGE: u8 = 0xB0;
pub const PROGRAM_CHANGE: u8 = 0xC0;
pub const CHANNEL_PRESSURE: u8 = 0xD0;
pub const PITCH_BEND: u8 = 0xE0;

// System common
pub const SYSTEM_EXCLUSIVE: u8 = 0xF0;
pub const MIDI_TIME_CODE: u8 = 0xF1;
pub const SONG_POSITION_POINTER: u8 = 0xF2;
pub const SONG_SELECT: u8 = 0xF3;
pub const TUNE_REQUEST: u8 = 0xF6;
pub const END_OF_EXCLUSIVE: u8 = 0xF7;

// System real-time
pub const TIMING_CLOCK: u8 = 0xF8;
pub const SONG_START: u8 = 0xFA;
pub const SONG_CONTINUE: u8 = 0xFB;
pub const SONG_STOP: u8 = 0xFC;
pub const ACTIVE_SENSING: u8 = 0xFE;
pub const SYSTEM_RESET: u8 = 0xFF;

// Controller numbers
pub const DATA_ENTRY_MSB: u8 = 6;
pub const DATA_ENTRY_LSB: u8 = 38;
pub const NRPN_LSB: u8 = 98;
pub const NRPN_MSB: u8 = 99;
pub const RPN_LSB: u8 = 100;
pub const RPN_MSB: u8 = 101;
pub const ALL_SOUND_OFF: u8 = 120;
pub const RESET_ALL_CONTROLLERS: u8 = 121;
pub const LOCAL_CONTROL: u8 = 122;
pub const ALL_NOTES_OFF: u8 = 123;

/// Number of MIDI 1.0 channels.
pub const CHANNELS: u8 = 16;

/// Total length (status included) of a non-sysex message, or `None` for
/// status bytes that are undefined or variable length.
pub const fn message_length(status: u8) -> Option<usize> {
    match status & 0xF0 {
        NOTE_OFF | NOTE_ON | POLY_PRESSURE | CONTROL_CHANGE | PITCH_BEND => Some(3),
        PROGRAM_CHANGE | CHANNEL_PRESSURE => Some(2),
        0xF0 => match status {
            MIDI_TIME_CODE | SONG_SELECT => Some(2),
            SONG_POSITION_POINTER => Some(3),
            TUNE_REQUEST => Some(1),
            TIMING_CLOCK | SONG_START | SONG_CONTINUE | SONG_STOP | ACTIVE_SENSING
            | SYSTEM_RESET => Some(1),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_message_lengths() {
        assert_eq!(message_length(NOTE_ON | 5), Some(3));
        assert_eq!(message_length(PROGRAM_CHANGE | 15), Some(2));
        assert_eq!(message_length(CHANNEL_PRESSURE), Some(2));
        assert_eq!(message_length(PITCH_BEND | 1), Some(3));
    }

    #[test]
    fn test_system_message_lengths() {
        assert_eq!(message_length(SONG_POSITION_POINTER), Some(3));
        assert_eq!(message_length(SONG_SELECT), Some(2));
        assert_eq!(message_length(TIMING_CLOCK), Some(1));
        assert_eq!(message_length(SYSTEM_EXCLUSIVE), None);
        assert_eq!(message_length(END_OF_EXCLUSIVE), None);
        assert_eq!(message_length(0xF4), None);
        assert_eq!(message_length(0xFD), None);
    }
}
