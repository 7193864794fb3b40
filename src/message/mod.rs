//! Commands understood by the device and typed views over their replies.
//!
//! The device speaks a small proprietary protocol: a command is written to
//! the command characteristic and the reply arrives as one or more
//! notifications on the status characteristic. Replies carry no length
//! prefix and no sequence number.
//!
//! | Opcode        | Meaning                       | Reply              |
//! |---------------|-------------------------------|--------------------|
//! | `0d`          | combined status               | single packet      |
//! | `10 00`       | device info                   | single packet      |
//! | `25`          | device info (variant)         | single packet      |
//! | `11 00/01`    | history dump                  | many 32 byte packets |

use std::borrow::Cow;
use std::fmt;

use crate::error::{Error, Result};

pub(crate) mod history_message;
pub(crate) mod info_message;
pub(crate) mod status_message;

/// An opaque request written verbatim to the command characteristic.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Command(Cow<'static, [u8]>);

impl Command {
    pub const fn from_static(bytes: &'static [u8]) -> Self {
        Self(Cow::Borrowed(bytes))
    }

    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(Cow::Owned(bytes.into()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Command({})", hex::encode(&self.0))
    }
}

/// How the end of a reply is detected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseMode {
    /// The first notification is the whole reply.
    Single,
    /// The reply is complete once no notification arrived for the whole
    /// inactivity window.
    Multi,
}

/// Read the signed little-endian 16 bit integer at `offset`.
pub(crate) fn read_i16_le(data: &[u8], offset: usize) -> Result<i16> {
    let required = offset + 2;
    match data.get(offset..required) {
        Some(&[lo, hi]) => Ok(i16::from_le_bytes([lo, hi])),
        _ => Err(Error::FrameTooShort { required, actual: data.len() }),
    }
}

/// Scale a raw fixed-point value (1/16 units) to a float.
pub fn decode_fixed(raw: i16) -> f64 {
    f64::from(raw) / 16.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_fixed_is_exact() {
        assert_eq!(decode_fixed(331), 20.6875);
        assert_eq!(decode_fixed(-16), -1.0);
        for raw in [i16::MIN, -1000, -2, 0, 1, 17, 704, i16::MAX] {
            assert_eq!(decode_fixed(raw), raw as f64 / 16.0);
        }
    }

    #[test]
    fn read_i16_le_signed() {
        let data = [0x0d, 0x4b, 0x01, 0xff, 0xff];
        assert_eq!(read_i16_le(&data, 1).unwrap(), 331);
        assert_eq!(read_i16_le(&data, 3).unwrap(), -1);
    }

    #[test]
    fn read_i16_le_past_end_is_an_error() {
        let data = [0x0d, 0x4b, 0x01, 0xff];
        match read_i16_le(&data, 3) {
            Err(Error::FrameTooShort { required, actual }) => {
                assert_eq!(required, 5);
                assert_eq!(actual, 4);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(read_i16_le(&[], 0), Err(Error::FrameTooShort { .. })));
    }

    #[test]
    fn command_debug_is_hex() {
        assert_eq!(format!("{:?}", Command::from_static(&[0x11, 0x01])), "Command(1101)");
        assert_eq!(Command::new(vec![0x0d]), Command::from_static(&[0x0d]));
    }
}
