//! CAN transport layer: frame representation, capture records and the
//! source/sink abstraction traits.
//!
//! ## Adapter defaults
//!
//! These constants mirror the settings the relay tool programs into both
//! adapters before the loop starts.

pub mod can_frame;
pub mod capture;
pub mod traits;

/// Default bus bitrate programmed on both channels (Hz).
pub const DEFAULT_BITRATE_HZ: u32 = 125_000;

/// Default per-read timeout (ms).
///
/// Bounds the only suspension point of the relay loop: once it expires the
/// adapter returns a capture flagged TIMEOUT instead of blocking forever.
pub const DEFAULT_READ_TIMEOUT_MS: u32 = 1000;

/// Number of GPIO pins configured as inputs on the ingress adapter.
pub const NUM_GPIOS: u8 = 8;

/// Default adapter port for the ingress (listening) channel.
pub const DEFAULT_INGRESS_PORT: u8 = 0;

/// Default adapter port for the egress (transmitting) channel.
pub const DEFAULT_EGRESS_PORT: u8 = 1;
