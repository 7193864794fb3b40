use crate::error::{Error, Result};
use crate::message::{decode_fixed, read_i16_le, Command, ResponseMode};

pub(crate) const MODE: ResponseMode = ResponseMode::Multi;

/// Every history notification is padded to this many bytes before parsing
pub const RECORD_SIZE: usize = 32;

const OFFSET_SEQUENCE: usize = 2;
const OFFSET_TEMPERATURE: usize = 4;
const OFFSET_HUMIDITY: usize = 6;

/// The two history dumps the device answers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HistoryPage {
    First,
    Second,
}

impl HistoryPage {
    pub fn request(self) -> Command {
        match self {
            HistoryPage::First => Command::from_static(&[0x11, 0x00]),
            HistoryPage::Second => Command::from_static(&[0x11, 0x01]),
        }
    }
}

/// One logged sample of the main probe.
///
/// The record layout was worked out by comparing dumps with the vendor app's
/// CSV export; only these three fields are known.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HistoryRecord {
    pub sequence: i16,
    /// °C
    pub temperature: f64,
    /// %
    pub humidity: f64,
}

/// A history dump: the received packets, each zero-padded to [`RECORD_SIZE`].
pub(crate) struct HistoryMessage(Vec<u8>);

impl HistoryMessage {
    pub fn new(packets: &[Vec<u8>]) -> Result<Self> {
        let mut data = Vec::with_capacity(packets.len() * RECORD_SIZE);
        for packet in packets {
            data.extend_from_slice(&pad_packet(packet, RECORD_SIZE)?);
        }
        Ok(Self(data))
    }

    pub fn records(&self) -> Result<Vec<HistoryRecord>> {
        self.0
            .chunks(RECORD_SIZE)
            .map(|record| {
                Ok(HistoryRecord {
                    sequence: read_i16_le(record, OFFSET_SEQUENCE)?,
                    temperature: decode_fixed(read_i16_le(record, OFFSET_TEMPERATURE)?),
                    humidity: decode_fixed(read_i16_le(record, OFFSET_HUMIDITY)?),
                })
            })
            .collect()
    }
}

/// Zero-pad `packet` to exactly `size` bytes.
pub(crate) fn pad_packet(packet: &[u8], size: usize) -> Result<Vec<u8>> {
    if packet.len() > size {
        return Err(Error::PacketTooLong { size: packet.len(), max: size });
    }
    let mut padded = packet.to_vec();
    padded.resize(size, 0);
    Ok(padded)
}
