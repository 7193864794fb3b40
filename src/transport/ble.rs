use bluest::{Adapter, Characteristic, Device};
use futures_util::StreamExt;
use tokio::sync::OnceCell;
use tokio::time::{timeout, Duration};

use crate::error::TransportError;
use crate::transport::{Notifications, Transport, COMMAND_CHARACTERISTIC_ID, STATUS_CHARACTERISTIC_ID};

/// [`Transport`] over a real BLE connection, built on `bluest`.
pub struct BleTransport {
    adapter: Adapter,
    device: Device,
    connect_timeout: Duration,
    gatt: OnceCell<Gatt>,
}

struct Gatt {
    command: Characteristic,
    status: Characteristic,
}

impl BleTransport {
    /// The system's default adapter, once it is powered on.
    pub async fn default_adapter() -> Result<Adapter, TransportError> {
        let adapter = Adapter::default().await.ok_or(TransportError::AdapterUnavailable)?;
        adapter.wait_available().await?;
        Ok(adapter)
    }

    pub fn new(adapter: Adapter, device: Device, connect_timeout: Duration) -> Self {
        Self { adapter, device, connect_timeout, gatt: OnceCell::new() }
    }

    /// Scan for the device with the given address (device id), giving up after `scan_timeout`.
    pub async fn find(
        adapter: Adapter,
        address: &str,
        scan_timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self, TransportError> {
        let device = Self::find_device(&adapter, address, scan_timeout).await?;
        Ok(Self::new(adapter, device, connect_timeout))
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    async fn find_device(adapter: &Adapter, address: &str, scan_timeout: Duration) -> Result<Device, TransportError> {
        let mut scan = adapter.scan(&[]).await?;
        let search = async {
            while let Some(found) = scan.next().await {
                let id = found.device.id().to_string();
                tracing::trace!(%id, name = ?found.adv_data.local_name, "advertisement");
                if id.eq_ignore_ascii_case(address) {
                    return Some(found.device);
                }
            }
            None
        };

        match timeout(scan_timeout, search).await {
            Ok(Some(device)) => Ok(device),
            _ => Err(TransportError::DeviceNotFound(address.to_owned())),
        }
    }

    async fn discover_gatt(&self) -> Result<Gatt, TransportError> {
        let mut command = None;
        let mut status = None;
        for service in self.device.discover_services().await? {
            for characteristic in service.discover_characteristics().await? {
                let uuid = characteristic.uuid();
                if uuid == COMMAND_CHARACTERISTIC_ID {
                    command = Some(characteristic);
                } else if uuid == STATUS_CHARACTERISTIC_ID {
                    status = Some(characteristic);
                }
            }
        }

        Ok(Gatt {
            command: command.ok_or(TransportError::CharacteristicNotFound(COMMAND_CHARACTERISTIC_ID))?,
            status: status.ok_or(TransportError::CharacteristicNotFound(STATUS_CHARACTERISTIC_ID))?,
        })
    }

    fn gatt(&self) -> Result<&Gatt, TransportError> {
        self.gatt.get().ok_or(TransportError::NotConnected)
    }
}

impl Transport for BleTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        if !self.device.is_connected().await {
            timeout(self.connect_timeout, self.adapter.connect_device(&self.device))
                .await
                .map_err(|_| TransportError::ConnectTimeout(self.connect_timeout))??;
            tracing::info!(device = %self.device.id(), "connected");
        }

        // characteristic handles stay valid across reconnects of the same device
        self.gatt.get_or_try_init(|| self.discover_gatt()).await?;
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        self.adapter.disconnect_device(&self.device).await?;
        tracing::info!(device = %self.device.id(), "disconnected");
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        self.device.is_connected().await
    }

    async fn subscribe(&self) -> Result<Notifications<'_>, TransportError> {
        let notifications = self.gatt()?.status.notify().await?;
        Ok(notifications.map(|n| n.map_err(TransportError::from)).boxed())
    }

    async fn write(&self, data: &[u8]) -> Result<(), TransportError> {
        self.gatt()?.command.write(data).await?;
        Ok(())
    }
}
