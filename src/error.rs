//! Error definitions shared across library modules.
//! Each type models a specific failure scenario (timestamp conversion, bus
//! reads and writes, relay termination, configuration, adapter setup, CLI).
use crate::protocol::relay::RelayCounters;
use crate::protocol::setup::Features;
use thiserror_no_std::Error;

//==================================================================================TIMESTAMP_ERROR
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Failures while converting raw device ticks into nanoseconds.
pub enum TimestampError {
    /// The inner `sample_rate_khz / 1000` division would yield zero.
    #[error("Sample rate too low: {sample_rate_khz} kHz (minimum 1000 kHz)")]
    SampleRateTooLow { sample_rate_khz: u32 },
    /// The converted value does not fit in 64 bits.
    #[error("Timestamp overflow for {ticks} ticks")]
    Overflow { ticks: u64 },
}

//==================================================================================BUS_ERRORS
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// A read attempt on the ingress channel failed. Non-fatal for the relay.
#[error("Read failed with code {code}")]
pub struct ReadError {
    /// Negative code returned by the adapter.
    pub code: i32,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// A transmission on the egress channel failed. Fatal for the relay.
#[error("Write failed with code {code}")]
pub struct WriteError {
    /// Code returned by the adapter.
    pub code: i32,
}

//==================================================================================RELAY_ERROR
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Conditions that abort a relay session.
pub enum RelayError {
    /// The egress adapter refused a frame; the loop stopped immediately.
    #[error("Egress write failed with code {code}")]
    Write {
        code: i32,
        /// Counters at the time of the failure.
        counters: RelayCounters,
    },
}

impl RelayError {
    /// Adapter code surfaced to the caller.
    pub fn code(&self) -> i32 {
        match self {
            RelayError::Write { code, .. } => *code,
        }
    }
}

//==================================================================================CONFIG_ERROR
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Rejected relay configuration.
pub enum ConfigError {
    /// Timestamps cannot be converted below 1000 kHz.
    #[error("Sample rate too low: {sample_rate_khz} kHz")]
    SampleRateTooLow { sample_rate_khz: u32 },
    /// A bitrate of zero cannot be programmed.
    #[error("Bitrate must be non-zero")]
    ZeroBitrate,
    /// A zero read timeout would turn every read into a timeout.
    #[error("Read timeout must be non-zero")]
    ZeroTimeout,
    /// Ingress and egress must be distinct adapters.
    #[error("Ingress and egress share port {port}")]
    SamePort { port: u8 },
}

//==================================================================================SETUP_ERROR
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Setup-phase failures. The relay never starts when one of these occurs.
pub enum SetupError {
    /// The adapter on `port` could not be opened.
    #[error("Unable to open adapter on port {port} (code {code})")]
    Open { port: u8, code: i32 },
    /// The adapter rejected the feature request outright.
    #[error("Feature request rejected on port {port} (code {code})")]
    FeatureRequest { port: u8, code: i32 },
    /// The adapter granted only part of the requested features.
    #[error(
        "Feature acquisition failed on port {port}: requested {requested:?}, granted {granted:?}"
    )]
    FeatureAcquisition {
        port: u8,
        requested: Features,
        granted: Features,
    },
    /// The adapter rejected a configuration command.
    #[error("Unable to configure adapter on port {port} (code {code})")]
    Configure { port: u8, code: i32 },
    /// The adapter could not be enabled.
    #[error("Unable to enable adapter on port {port} (code {code})")]
    Enable { port: u8, code: i32 },
    /// The adapter reported a sample rate unusable for timestamps.
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

//==================================================================================USAGE_ERROR
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Malformed command-line arguments.
pub enum UsageError {
    /// Fewer than the two required positional arguments.
    #[error("Expected 2 arguments, got {found}")]
    MissingArguments { found: usize },
    /// An argument is not a decimal integer.
    #[error("Argument {position} is not a valid number")]
    InvalidNumber { position: usize },
}
