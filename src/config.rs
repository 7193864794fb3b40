//! Client configuration.

use std::time::Duration;

use crate::collector::DEFAULT_POLL_INTERVAL;

/// Timing knobs of a [`ThermoClient`](crate::ThermoClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// How long to wait for the BLE connection to come up.
    pub connect_timeout: Duration,
    /// How long to wait for a reply. For multi-packet replies this is the
    /// inactivity window after the last packet.
    pub read_timeout: Duration,
    /// How long a status frame is served from cache before the device is
    /// asked again.
    pub cache_ttl: Duration,
    /// Granularity of timeout detection.
    pub poll_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            read_timeout: Duration::from_millis(500),
            cache_ttl: Duration::from_millis(500),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl ClientConfig {
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    pub fn with_cache_ttl(mut self, cache_ttl: Duration) -> Self {
        self.cache_ttl = cache_ttl;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(15));
        assert_eq!(config.read_timeout, Duration::from_millis(500));
        assert_eq!(config.cache_ttl, Duration::from_millis(500));
        assert_eq!(config.poll_interval, Duration::from_millis(100));
    }

    #[test]
    fn setters_chain() {
        let config = ClientConfig::default()
            .with_read_timeout(Duration::from_secs(2))
            .with_cache_ttl(Duration::ZERO);
        assert_eq!(config.read_timeout, Duration::from_secs(2));
        assert_eq!(config.cache_ttl, Duration::ZERO);
        assert_eq!(config.connect_timeout, Duration::from_secs(15));
    }
}
