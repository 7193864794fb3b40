//! Read temperature, humidity and vapor-pressure deficit from Vivosun AeroLab
//! thermo-hygrometers (advertised as "ThermoBeacon2") over Bluetooth Low Energy.
//!
//! The device has a built-in sensor and an optional wired external probe.
//! It speaks a small proprietary protocol: a command is written to one GATT
//! characteristic and the reply is pushed back as notifications on another,
//! without any length or request id. [`ThermoClient`] pairs each command with
//! its reply, caches the status frame briefly and decodes it.
//!
//! Currently the following data can be accessed:
//!
//! - Temperature (°C or °F) of either probe
//! - Relative humidity (%) of either probe
//! - VPD (kPa) of either probe
//! - Whether the external probe is plugged in
//! - Logged history and the raw device information block
//!
//! # Example
//!
//! ```no_run
//! # use vivosun_thermo::{ClientConfig, Probe, TemperatureUnit, ThermoClient};
//! #
//! # #[tokio::main]
//! # pub async fn main() -> Result<(), vivosun_thermo::Error> {
//!     let client = ThermoClient::find("AA:BB:CC:DD:EE:FF", ClientConfig::default()).await?;
//!     client.connect().await?;
//!     let temperature = client.current_temperature(Probe::Main, TemperatureUnit::Celsius).await?;
//!     let vpd = client.current_vpd(Probe::Main).await?;
//!     println!("{temperature:.1}°C, {vpd:.2} kPa");
//!     client.disconnect().await?;
//! #   Ok(())
//! # }
//! ```

mod collector;
mod config;
pub mod conversion;
mod error;
pub mod format;
mod message;
mod probe_reading;
pub mod scanner;
mod thermo_client;
pub mod transport;

pub use collector::{CancelHandle, CollectorOutcome, Response, ResponseCollector, DEFAULT_POLL_INTERVAL};
pub use config::ClientConfig;
pub use error::{Error, Result, TransportError};
pub use message::history_message::{HistoryPage, HistoryRecord, RECORD_SIZE};
pub use message::info_message::{REQUEST as DEVICE_INFO_REQUEST, REQUEST_VARIANT as DEVICE_INFO_VARIANT_REQUEST};
pub use message::status_message::{StatusFrame, ABSENT, REQUEST as STATUS_REQUEST};
pub use message::{decode_fixed, Command, ResponseMode};
pub use probe_reading::{Probe, ProbeReading, TemperatureUnit};
pub use thermo_client::ThermoClient;
