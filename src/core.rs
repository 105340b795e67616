//! Shared value types exchanged between the transport layer, the decoders
//! and the relay: the per-read capture metadata and the raw bit layout the
//! adapter uses to encode it.

/// Maximum payload length of a classic CAN frame.
pub const MAX_PAYLOAD_LEN: usize = 8;

/// Read code reported when the adapter hands over a frame whose length
/// exceeds [`MAX_PAYLOAD_LEN`].
pub const READ_ERR_INVALID_LENGTH: i32 = -1000;

//==================================================================================CAPTURE_METADATA
/// Side information delivered by the adapter with every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CaptureMetadata {
    /// Raw timestamp in sample-clock ticks.
    pub timestamp: u64,
    /// Raw status bitmask (see [`status_bits`]).
    pub status: u32,
    /// Raw event bitmask (see [`event_bits`]).
    pub events: u32,
    /// Bitrate in effect when the frame was captured (Hz).
    pub bitrate_hz: u32,
    /// Read-result code: payload length on success, negative on error.
    pub result: i32,
}

//==================================================================================ADAPTER_BIT_LAYOUT
/// Status bits reported by the adapter. A raw value of `0` means OK.
pub mod status_bits {
    pub const OK: u32 = 0x0000;
    pub const TIMEOUT: u32 = 0x0100;
    pub const ERR_OVERFLOW: u32 = 0x0200;
    pub const END_OF_CAPTURE: u32 = 0x0400;
    pub const CAN_ERR: u32 = 0x0800;
    /// Low-order bits carrying the bus error code when [`CAN_ERR`] is set.
    pub const CAN_ERR_FULL_MASK: u32 = 0x00FF;
    pub const CAN_ARB_LOST: u32 = 0x1000;
}

/// Event bits reported by the adapter.
pub mod event_bits {
    pub const DIGITAL_INPUT: u32 = 0x0000_0100;
    /// Low-order bits carrying the GPIO pins that changed.
    pub const DIGITAL_INPUT_MASK: u32 = 0x0000_00FF;
    pub const CAN_BUS_STATE_LISTEN_ONLY: u32 = 0x0000_1000;
    pub const CAN_BUS_STATE_CONTROL: u32 = 0x0000_2000;
    pub const CAN_BUS_STATE_WARNING: u32 = 0x0000_4000;
    pub const CAN_BUS_STATE_ACTIVE: u32 = 0x0000_8000;
    pub const CAN_BUS_STATE_PASSIVE: u32 = 0x0001_0000;
    pub const CAN_BUS_STATE_OFF: u32 = 0x0002_0000;
    pub const CAN_BUS_BITRATE: u32 = 0x0004_0000;
}
