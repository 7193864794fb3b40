//! Human readable and JSON rendering of readings.

use serde::Serialize;

use crate::probe_reading::{Probe, ProbeReading, TemperatureUnit};

pub fn format_temperature(value: f64, unit: TemperatureUnit) -> String {
    format!("{value:.1}{}", unit.symbol())
}

pub fn format_humidity(value: f64) -> String {
    format!("{value:.0}%")
}

pub fn format_vpd(value: f64) -> String {
    format!("{value:.2} kPa")
}

/// Readings of both probes. `external_sensor` is left out of the JSON
/// entirely when no external probe is plugged in.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StatusReport {
    pub main_sensor: ProbeReading,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_sensor: Option<ProbeReading>,
}

impl StatusReport {
    pub fn to_text(&self, unit: TemperatureUnit) -> String {
        let mut text = probe_text(Probe::Main, &self.main_sensor, unit);
        if let Some(external) = &self.external_sensor {
            text.push('\n');
            text.push_str(&probe_text(Probe::External, external, unit));
        }
        text
    }
}

fn probe_text(probe: Probe, reading: &ProbeReading, unit: TemperatureUnit) -> String {
    format!(
        "{probe} Sensor:\n  Temperature: {}\n  Humidity: {}\n  VPD: {}\n",
        format_temperature(reading.temperature, unit),
        format_humidity(reading.humidity),
        format_vpd(reading.vpd),
    )
}
