//! Relay session configuration.
//!
//! Everything here is applied once, before the relay loop starts: adapter
//! ports, bitrate, read timeout and target power go to the setup phase, the
//! frame budget goes to the loop.
use crate::error::ConfigError;
use crate::protocol::transport::{
    DEFAULT_BITRATE_HZ, DEFAULT_EGRESS_PORT, DEFAULT_INGRESS_PORT, DEFAULT_READ_TIMEOUT_MS,
};
use embassy_time::Duration;

/// Validated relay configuration. Build it with [`RelayConfig::builder`].
///
/// # Example
///
/// ```
/// use can_mitm::config::RelayConfig;
///
/// let config = RelayConfig::builder()
///     .max_events(3)
///     .target_power(true)
///     .build()
///     .unwrap();
///
/// assert_eq!(config.max_events(), 3);
/// assert_eq!(config.bitrate_hz(), 125_000);
/// assert!(config.is_bounded());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayConfig {
    max_events: u64,
    bitrate_hz: u32,
    read_timeout: Duration,
    target_power: bool,
    ingress_port: u8,
    egress_port: u8,
}

impl RelayConfig {
    /// Builder pre-filled with the adapter defaults.
    pub const fn builder() -> RelayConfigBuilder {
        RelayConfigBuilder::new()
    }

    /// Frame budget; `0` means unbounded.
    #[inline]
    pub const fn max_events(&self) -> u64 {
        self.max_events
    }

    /// `true` when the session stops on its own after `max_events` frames.
    #[inline]
    pub const fn is_bounded(&self) -> bool {
        self.max_events != 0
    }

    #[inline]
    pub const fn bitrate_hz(&self) -> u32 {
        self.bitrate_hz
    }

    /// Upper bound of a single ingress read.
    #[inline]
    pub const fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    #[inline]
    pub const fn target_power(&self) -> bool {
        self.target_power
    }

    #[inline]
    pub const fn ingress_port(&self) -> u8 {
        self.ingress_port
    }

    #[inline]
    pub const fn egress_port(&self) -> u8 {
        self.egress_port
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            max_events: 0,
            bitrate_hz: DEFAULT_BITRATE_HZ,
            read_timeout: Duration::from_millis(DEFAULT_READ_TIMEOUT_MS as u64),
            target_power: false,
            ingress_port: DEFAULT_INGRESS_PORT,
            egress_port: DEFAULT_EGRESS_PORT,
        }
    }
}

//==================================================================================RELAY_CONFIG_BUILDER
/// Fluent builder for [`RelayConfig`].
#[derive(Debug, Clone, Copy)]
pub struct RelayConfigBuilder {
    max_events: u64,
    bitrate_hz: u32,
    read_timeout_ms: u32,
    target_power: bool,
    ingress_port: u8,
    egress_port: u8,
}

impl RelayConfigBuilder {
    pub const fn new() -> Self {
        Self {
            max_events: 0,
            bitrate_hz: DEFAULT_BITRATE_HZ,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            target_power: false,
            ingress_port: DEFAULT_INGRESS_PORT,
            egress_port: DEFAULT_EGRESS_PORT,
        }
    }

    /// Number of frames to process before stopping (`0` = unbounded).
    pub const fn max_events(mut self, max_events: u64) -> Self {
        self.max_events = max_events;
        self
    }

    pub const fn bitrate_hz(mut self, bitrate_hz: u32) -> Self {
        self.bitrate_hz = bitrate_hz;
        self
    }

    pub const fn read_timeout_ms(mut self, read_timeout_ms: u32) -> Self {
        self.read_timeout_ms = read_timeout_ms;
        self
    }

    /// Power the target through the ingress adapter.
    pub const fn target_power(mut self, on: bool) -> Self {
        self.target_power = on;
        self
    }

    pub const fn ports(mut self, ingress: u8, egress: u8) -> Self {
        self.ingress_port = ingress;
        self.egress_port = egress;
        self
    }

    /// Validate and freeze the configuration.
    pub fn build(self) -> Result<RelayConfig, ConfigError> {
        if self.bitrate_hz == 0 {
            return Err(ConfigError::ZeroBitrate);
        }
        if self.read_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.ingress_port == self.egress_port {
            return Err(ConfigError::SamePort {
                port: self.ingress_port,
            });
        }
        Ok(RelayConfig {
            max_events: self.max_events,
            bitrate_hz: self.bitrate_hz,
            read_timeout: Duration::from_millis(self.read_timeout_ms as u64),
            target_power: self.target_power,
            ingress_port: self.ingress_port,
            egress_port: self.egress_port,
        })
    }
}

impl Default for RelayConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
