//! Discovery of nearby thermometers by advertised name.

use std::collections::HashSet;

use bluest::Adapter;
use futures_util::StreamExt;
use serde::Serialize;
use tokio::time::{timeout_at, Duration, Instant};

use crate::error::TransportError;

/// Name advertised by the Vivosun AeroLab thermo-hygrometer
pub const DEVICE_NAME: &str = "ThermoBeacon2";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DiscoveredDevice {
    pub address: String,
    pub name: String,
}

/// Scan for `scan_timeout` and return every thermometer seen, each once, in
/// the order they were first seen.
pub async fn discover(adapter: &Adapter, scan_timeout: Duration) -> Result<Vec<DiscoveredDevice>, TransportError> {
    let deadline = Instant::now() + scan_timeout;
    let mut scan = adapter.scan(&[]).await?;
    let mut seen = HashSet::new();
    let mut found = Vec::new();

    while let Ok(Some(advertisement)) = timeout_at(deadline, scan.next()).await {
        let name = advertisement.adv_data.local_name.clone();
        let address = advertisement.device.id().to_string();
        tracing::trace!(%address, ?name, "advertisement");
        if let Some(device) = matching(address, name) {
            if seen.insert(device.address.clone()) {
                tracing::debug!(address = %device.address, "found thermometer");
                found.push(device);
            }
        }
    }

    Ok(found)
}

fn matching(address: String, name: Option<String>) -> Option<DiscoveredDevice> {
    match name {
        Some(name) if name == DEVICE_NAME => Some(DiscoveredDevice { address, name }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_by_advertised_name() {
        assert_eq!(
            matching("AA:BB".into(), Some("ThermoBeacon2".into())),
            Some(DiscoveredDevice { address: "AA:BB".into(), name: "ThermoBeacon2".into() })
        );
        assert_eq!(matching("AA:BB".into(), Some("ThermoBeacon".into())), None);
        assert_eq!(matching("AA:BB".into(), None), None);
    }
}
