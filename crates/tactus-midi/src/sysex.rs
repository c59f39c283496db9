//! System exclusive helpers.

use crate::error::{MessageError, Result};
use crate::message::RawMessage;

/// Parses a sysex block written as hexadecimal, e.g. `"F0 7E 00 09 01 F7"`.
///
/// Whitespace between bytes is ignored. The result must be a complete
/// `0xF0 .. 0xF7` block.
pub fn parse_sysex_hex(s: &str) -> Result<RawMessage> {
    let digits: Vec<u8> = s.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    if digits.len() % 2 != 0 {
        return Err(MessageError::InvalidHex(format!(
            "odd number of hex digits in {s:?}"
        )));
    }

    let bytes = digits
        .chunks_exact(2)
        .map(|pair| {
            let text = std::str::from_utf8(pair)
                .map_err(|_| MessageError::InvalidHex(format!("non-ascii input {s:?}")))?;
            u8::from_str_radix(text, 16)
                .map_err(|_| MessageError::InvalidHex(format!("bad byte {text:?}")))
        })
        .collect::<Result<Vec<u8>>>()?;

    RawMessage::sysex(bytes)
}
