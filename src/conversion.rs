//! Unit conversions and vapor-pressure deficit.

/// Convert degrees Celsius to degrees Fahrenheit.
pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

/// Convert degrees Fahrenheit to degrees Celsius.
pub fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
    (fahrenheit - 32.0) * 5.0 / 9.0
}

/// Vapor-pressure deficit in kPa for a temperature in °C and a relative humidity in %.
///
/// Uses the Tetens equation for the saturation vapor pressure:
/// `e_s = 0.6108 * exp(17.27 * T / (T + 237.3))`, `VPD = e_s - e_s * RH / 100`.
pub fn vpd(temperature_c: f64, humidity_pct: f64) -> f64 {
    let e_s = 0.6108 * ((17.27 * temperature_c) / (temperature_c + 237.3)).exp();
    let e_a = e_s * (humidity_pct / 100.0);
    e_s - e_a
}
