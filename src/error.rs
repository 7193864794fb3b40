//! Error types for the thermometer client.

use std::time::Duration;

use bluest::Uuid;

/// Errors surfaced by [`ThermoClient`](crate::ThermoClient) and the decoding helpers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The transport failed to connect, write or subscribe. Not retried.
    #[error("transport error")]
    Transport(#[from] TransportError),

    /// No complete response arrived in time. `partial` holds whatever was
    /// received before the deadline and may be empty.
    #[error("no response within {timeout:?} ({} bytes received)", .partial.len())]
    ReadTimeout {
        timeout: Duration,
        partial: Vec<u8>,
    },

    /// A field was decoded from a buffer that does not reach its offset.
    #[error("frame too short: need {required} bytes, got {actual}")]
    FrameTooShort { required: usize, actual: usize },

    /// Another command is already in flight on this client.
    #[error("another command is already in flight on this client")]
    SessionBusy,

    /// The read was canceled before a response was received.
    #[error("read canceled")]
    Canceled,

    /// A bulk packet does not fit into its fixed-size record.
    #[error("packet of {size} bytes exceeds the {max} byte record size")]
    PacketTooLong { size: usize, max: usize },
}

/// Errors raised by the BLE transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error(transparent)]
    Ble(#[from] bluest::Error),

    #[error("no bluetooth adapter available")]
    AdapterUnavailable,

    #[error("device {0} not found")]
    DeviceNotFound(String),

    #[error("the device does not expose characteristic {0}")]
    CharacteristicNotFound(Uuid),

    #[error("connect timed out after {0:?}")]
    ConnectTimeout(Duration),

    #[error("not connected")]
    NotConnected,

    #[error("no notification subscription is active")]
    NotSubscribed,

    #[error("notification stream closed")]
    NotificationsClosed,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
