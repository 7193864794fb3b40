use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// One of the two temperature/humidity inputs of the device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Probe {
    /// The sensor built into the device.
    Main,
    /// The wired external sensor, which may not be plugged in.
    External,
}

impl fmt::Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Probe::Main => f.write_str("Main"),
            Probe::External => f.write_str("External"),
        }
    }
}

/// The unit a temperature is reported in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn symbol(self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        }
    }
}

impl FromStr for TemperatureUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "c" | "C" => Ok(TemperatureUnit::Celsius),
            "f" | "F" => Ok(TemperatureUnit::Fahrenheit),
            other => Err(format!("invalid unit '{other}' (expected 'c' or 'f')")),
        }
    }
}

/// A decoded reading of a single probe
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ProbeReading {
    /// Temperature in the unit it was requested in
    pub temperature: f64,
    /// Relative humidity in %
    pub humidity: f64,
    /// Vapor-pressure deficit in kPa
    pub vpd: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_unit() {
        assert_eq!("c".parse::<TemperatureUnit>(), Ok(TemperatureUnit::Celsius));
        assert_eq!("F".parse::<TemperatureUnit>(), Ok(TemperatureUnit::Fahrenheit));
        assert!("k".parse::<TemperatureUnit>().is_err());
    }

    #[test]
    fn serializes_flat() {
        let reading = ProbeReading { temperature: 20.5, humidity: 44.0, vpd: 1.25 };
        let json = serde_json::to_value(reading).unwrap();
        assert_eq!(json, serde_json::json!({"temperature": 20.5, "humidity": 44.0, "vpd": 1.25}));
    }
}
