//! Client for Vivosun AeroLab thermo-hygrometers ("ThermoBeacon2").
//!
//! The device exposes two GATT characteristics: commands are written to
//! `fff5` and replies arrive as notifications on `fff3`. Replies carry no
//! request id, so a client keeps at most one command in flight; every read
//! goes through a single gate and overlapping raw commands fail with
//! [`Error::SessionBusy`].
//!
//! Temperature, humidity and VPD all come from the same combined status
//! frame, which is cached for [`ClientConfig::cache_ttl`] so that reading
//! several values in a row costs a single round trip.

use std::future::Future;
use std::sync::{Mutex as SyncMutex, PoisonError};

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::collector::{CancelHandle, Response, ResponseCollector};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::format::StatusReport;
use crate::message::history_message::{self, HistoryMessage, HistoryPage, HistoryRecord};
use crate::message::status_message::{self, StatusFrame};
use crate::message::{info_message, Command, ResponseMode};
use crate::probe_reading::{Probe, ProbeReading, TemperatureUnit};
use crate::transport::{BleTransport, Transport};

struct CacheEntry {
    frame: StatusFrame,
    captured_at: Instant,
}

/// Forgets the cancel handle of a command once it is no longer in flight,
/// including when the caller drops the read.
struct ClearOnDrop<'a>(&'a SyncMutex<Option<CancelHandle>>);

impl Drop for ClearOnDrop<'_> {
    fn drop(&mut self) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

pub struct ThermoClient<T = BleTransport> {
    transport: T,
    config: ClientConfig,
    cache: Mutex<Option<CacheEntry>>,
    in_flight: Mutex<()>,
    current: SyncMutex<Option<CancelHandle>>,
}

impl ThermoClient<BleTransport> {
    /// Locate the device with the given address on the default adapter.
    ///
    /// The scan gives up after [`ClientConfig::connect_timeout`]. The client
    /// is not connected yet.
    pub async fn find(address: &str, config: ClientConfig) -> Result<Self> {
        let adapter = BleTransport::default_adapter().await?;
        let transport = BleTransport::find(adapter, address, config.connect_timeout, config.connect_timeout).await?;
        Ok(Self::new(transport, config))
    }
}

impl<T: Transport> ThermoClient<T> {
    pub fn new(transport: T, config: ClientConfig) -> Self {
        Self {
            transport,
            config,
            cache: Mutex::new(None),
            in_flight: Mutex::new(()),
            current: SyncMutex::new(None),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub async fn connect(&self) -> Result<()> {
        self.transport.connect().await?;
        Ok(())
    }

    pub async fn disconnect(&self) -> Result<()> {
        self.transport.disconnect().await?;
        Ok(())
    }

    pub async fn is_connected(&self) -> bool {
        self.transport.is_connected().await
    }

    /// Connect, run `f` and disconnect again, even if `f` failed.
    ///
    /// An error from `f` takes precedence over a failure to disconnect.
    pub async fn session<'a, F, Fut, R, E>(&'a self, f: F) -> Result<R, E>
    where
        F: FnOnce(&'a Self) -> Fut,
        Fut: Future<Output = Result<R, E>>,
        E: From<Error>,
    {
        self.connect().await?;
        let result = f(self).await;
        match self.disconnect().await {
            Ok(()) => result,
            Err(err) => match result {
                Ok(_) => Err(err.into()),
                Err(inner) => {
                    tracing::warn!(%err, "failed to disconnect after error");
                    Err(inner)
                }
            },
        }
    }

    /// Temperature of `probe` in `unit`
    pub async fn current_temperature(&self, probe: Probe, unit: TemperatureUnit) -> Result<f64> {
        Ok(self.status().await?.reading(probe, unit)?.temperature)
    }

    /// Relative humidity of `probe` in %
    pub async fn current_humidity(&self, probe: Probe) -> Result<f64> {
        self.status().await?.humidity(probe)
    }

    /// Vapor-pressure deficit of `probe` in kPa
    pub async fn current_vpd(&self, probe: Probe) -> Result<f64> {
        Ok(self.status().await?.reading(probe, TemperatureUnit::Celsius)?.vpd)
    }

    pub async fn has_external_probe(&self) -> Result<bool> {
        self.status().await?.has_external_probe()
    }

    /// Temperature, humidity and VPD of `probe` from a single status frame
    pub async fn reading(&self, probe: Probe, unit: TemperatureUnit) -> Result<ProbeReading> {
        self.status().await?.reading(probe, unit)
    }

    /// Readings of the main probe and, if plugged in, the external probe
    pub async fn report(&self, unit: TemperatureUnit) -> Result<StatusReport> {
        let frame = self.status().await?;
        let external_sensor = if frame.has_external_probe()? {
            Some(frame.reading(Probe::External, unit)?)
        } else {
            None
        };
        Ok(StatusReport { main_sensor: frame.reading(Probe::Main, unit)?, external_sensor })
    }

    /// The combined status frame, from cache if it is younger than the TTL.
    ///
    /// Concurrent callers queue up here, so a burst of reads costs at most
    /// one round trip.
    pub async fn status(&self) -> Result<StatusFrame> {
        let mut cache = self.cache.lock().await;
        if let Some(entry) = cache.as_ref() {
            if entry.captured_at.elapsed() < self.config.cache_ttl {
                tracing::trace!("status served from cache");
                return Ok(entry.frame.clone());
            }
        }

        tracing::trace!("status cache stale, reading device");
        let response = self.send_command(&status_message::REQUEST, status_message::MODE).await?;
        let frame = StatusFrame::new(response.to_bytes());
        *cache = Some(CacheEntry { frame: frame.clone(), captured_at: Instant::now() });
        Ok(frame)
    }

    /// Raw reply to the device information request
    pub async fn read_device_info(&self) -> Result<Vec<u8>> {
        let response = self.send_command(&info_message::REQUEST, info_message::MODE).await?;
        Ok(response.to_bytes())
    }

    /// Raw reply to the alternate device information request
    pub async fn read_device_info_variant(&self) -> Result<Vec<u8>> {
        let response = self.send_command(&info_message::REQUEST_VARIANT, info_message::MODE).await?;
        Ok(response.to_bytes())
    }

    /// Download one page of logged samples.
    ///
    /// The dump ends once the device has been silent for the read timeout.
    pub async fn read_history(&self, page: HistoryPage) -> Result<Vec<HistoryRecord>> {
        let response = self.send_command(&page.request(), history_message::MODE).await?;
        HistoryMessage::new(response.packets())?.records()
    }

    /// Send `command` and wait for its reply.
    ///
    /// Fails with [`Error::SessionBusy`] if another command is in flight.
    pub async fn send_command(&self, command: &Command, mode: ResponseMode) -> Result<Response> {
        let _gate = self.in_flight.try_lock().map_err(|_| Error::SessionBusy)?;

        let collector = ResponseCollector::new(mode, self.config.read_timeout).with_poll_interval(self.config.poll_interval);
        *self.current() = Some(collector.cancel_handle());
        let _current = ClearOnDrop(&self.current);
        let outcome = collector.run(&self.transport, command).await;

        outcome?.into_result(self.config.read_timeout)
    }

    /// Stop waiting for the reply to the command in flight, if any.
    ///
    /// Returns whether a pending read was canceled.
    pub fn cancel(&self) -> bool {
        match self.current().as_ref() {
            Some(handle) => handle.cancel(),
            None => false,
        }
    }

    fn current(&self) -> std::sync::MutexGuard<'_, Option<CancelHandle>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
