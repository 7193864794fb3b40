//! The seam between the protocol logic and the Bluetooth stack.

use futures_util::stream::BoxStream;

use crate::error::TransportError;

mod ble;
#[cfg(test)]
pub(crate) mod mock;

pub use ble::BleTransport;

/// Command characteristic, write only
pub const COMMAND_CHARACTERISTIC_ID: bluest::Uuid =
    bluest::Uuid::from_u128(0x0000fff5_0000_1000_8000_00805f9b34fb);
/// Status characteristic, notify only
pub const STATUS_CHARACTERISTIC_ID: bluest::Uuid =
    bluest::Uuid::from_u128(0x0000fff3_0000_1000_8000_00805f9b34fb);

/// Notifications received on the status characteristic, in delivery order.
///
/// Dropping the stream ends the subscription.
pub type Notifications<'a> = BoxStream<'a, Result<Vec<u8>, TransportError>>;

/// A connection to one device exposing the command and status characteristics.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn connect(&self) -> Result<(), TransportError>;

    async fn disconnect(&self) -> Result<(), TransportError>;

    async fn is_connected(&self) -> bool;

    /// Start receiving notifications from the status characteristic.
    async fn subscribe(&self) -> Result<Notifications<'_>, TransportError>;

    /// Write `data` to the command characteristic.
    async fn write(&self, data: &[u8]) -> Result<(), TransportError>;
}
