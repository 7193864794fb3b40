use crate::conversion::{celsius_to_fahrenheit, vpd};
use crate::error::{Error, Result};
use crate::message::{decode_fixed, read_i16_le, Command, ResponseMode};
use crate::probe_reading::{Probe, ProbeReading, TemperatureUnit};

/// Requests the combined status of both probes
pub const REQUEST: Command = Command::from_static(&[0x0d]);
pub(crate) const MODE: ResponseMode = ResponseMode::Single;

const OFFSET_MAIN_TEMPERATURE: usize = 1;
const OFFSET_MAIN_HUMIDITY: usize = 3;
const OFFSET_EXTERNAL_TEMPERATURE: usize = 7;
const OFFSET_EXTERNAL_HUMIDITY: usize = 9;

/// Raw value reported for a field of an unplugged probe (`ff ff`)
pub const ABSENT: i16 = -1;

/// The reply to the combined status request.
///
/// Layout, all fields signed 16 bit little endian in 1/16 units:
///
/// Offset | Field
/// 1      | main temperature (°C)
/// 3      | main humidity (%)
/// 7      | external temperature (°C), `ff ff` when absent
/// 9      | external humidity (%), `ff ff` when absent
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusFrame(Vec<u8>);

impl StatusFrame {
    /// Shortest frame any field is decoded from
    pub const MIN_LEN: usize = OFFSET_EXTERNAL_HUMIDITY + 2;

    pub fn new(data: Vec<u8>) -> Self {
        Self(data)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn raw_temperature(&self, probe: Probe) -> Result<i16> {
        let offset = match probe {
            Probe::Main => OFFSET_MAIN_TEMPERATURE,
            Probe::External => OFFSET_EXTERNAL_TEMPERATURE,
        };
        self.field(offset)
    }

    pub fn raw_humidity(&self, probe: Probe) -> Result<i16> {
        let offset = match probe {
            Probe::Main => OFFSET_MAIN_HUMIDITY,
            Probe::External => OFFSET_EXTERNAL_HUMIDITY,
        };
        self.field(offset)
    }

    /// Every field requires a frame of at least [`Self::MIN_LEN`] bytes, even
    /// those of the main probe.
    fn field(&self, offset: usize) -> Result<i16> {
        if self.0.len() < Self::MIN_LEN {
            return Err(Error::FrameTooShort { required: Self::MIN_LEN, actual: self.0.len() });
        }
        read_i16_le(&self.0, offset)
    }

    /// Temperature of `probe` in °C
    pub fn temperature(&self, probe: Probe) -> Result<f64> {
        self.raw_temperature(probe).map(decode_fixed)
    }

    /// Relative humidity of `probe` in %
    pub fn humidity(&self, probe: Probe) -> Result<f64> {
        self.raw_humidity(probe).map(decode_fixed)
    }

    /// The external probe counts as present only if neither of its fields
    /// holds the [`ABSENT`] marker.
    pub fn has_external_probe(&self) -> Result<bool> {
        let temperature = self.raw_temperature(Probe::External)?;
        let humidity = self.raw_humidity(Probe::External)?;
        Ok(temperature != ABSENT && humidity != ABSENT)
    }

    /// Decode temperature, humidity and VPD of `probe`. VPD is always
    /// computed from the Celsius temperature.
    pub fn reading(&self, probe: Probe, unit: TemperatureUnit) -> Result<ProbeReading> {
        let temperature_c = self.temperature(probe)?;
        let humidity = self.humidity(probe)?;
        let temperature = match unit {
            TemperatureUnit::Celsius => temperature_c,
            TemperatureUnit::Fahrenheit => celsius_to_fahrenheit(temperature_c),
        };
        Ok(ProbeReading { temperature, humidity, vpd: vpd(temperature_c, humidity) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAIN_ONLY: &str = "0d4b01c3028800ffffffffffff0000000000000000";
    const BOTH: &str = "0d56017d0299005a016e029e0000000000000000";

    fn frame(h: &str) -> StatusFrame {
        StatusFrame::new(hex::decode(h).unwrap())
    }

    fn round(value: f64, decimals: i32) -> f64 {
        let factor = 10f64.powi(decimals);
        (value * factor).round() / factor
    }

    #[test]
    fn decode_main_probe() {
        let f = frame(MAIN_ONLY);
        assert_eq!(f.raw_temperature(Probe::Main).unwrap(), 331);
        assert_eq!(f.temperature(Probe::Main).unwrap(), 20.6875);
        assert_eq!(round(f.humidity(Probe::Main).unwrap(), 0), 44.0);
        assert!(!f.has_external_probe().unwrap());
    }

    #[test]
    fn decode_external_probe() {
        let f = frame(BOTH);
        assert!(f.has_external_probe().unwrap());
        let reading = f.reading(Probe::External, TemperatureUnit::Fahrenheit).unwrap();
        assert_eq!(round(reading.temperature, 1), 70.9);
        assert_eq!(round(reading.humidity, 0), 39.0);
        assert_eq!(round(reading.vpd, 2), 1.58);
    }

    #[test]
    fn external_probe_absent_when_only_one_field_is_marked() {
        // temperature present, humidity marked absent
        let f = frame("0d56017d0299005a01ffff9e00");
        assert!(!f.has_external_probe().unwrap());
        // temperature marked absent, humidity present
        let f = frame("0d56017d029900ffff6e029e00");
        assert!(!f.has_external_probe().unwrap());
    }

    #[test]
    fn short_frame_is_rejected() {
        let f = frame("0d4b01c302880000");
        match f.temperature(Probe::Main) {
            Err(Error::FrameTooShort { required: 11, actual: 8 }) => {}
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(f.humidity(Probe::External), Err(Error::FrameTooShort { required: 11, actual: 8 })));
        assert!(matches!(f.has_external_probe(), Err(Error::FrameTooShort { .. })));
        assert!(matches!(
            StatusFrame::new(vec![0x0d]).temperature(Probe::Main),
            Err(Error::FrameTooShort { required: 11, actual: 1 })
        ));
    }

    #[test]
    fn minimum_length_frame_decodes() {
        let f = frame("0d4b01c3028800ffffffff");
        assert_eq!(f.as_bytes().len(), StatusFrame::MIN_LEN);
        assert_eq!(f.temperature(Probe::Main).unwrap(), 20.6875);
        assert!(!f.has_external_probe().unwrap());
    }
}
