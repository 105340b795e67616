//! Status bitmask decoder.
//!
//! # Bit layout
//!
//! ```text
//! 0x0000        : OK (no other bit set)
//! 0x0100        : read timeout
//! 0x0200        : capture buffer overflow
//! 0x0400        : end of capture
//! 0x0800        : bus error, code in bits 0-7
//! 0x1000        : arbitration lost
//! ```
use crate::core::status_bits;
use bitflags::bitflags;
use core::fmt;

bitflags! {
    /// Status conditions, independent of the adapter's bit positions.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StatusFlags: u8 {
        const OK = 1 << 0;
        const TIMEOUT = 1 << 1;
        const OVERFLOW = 1 << 2;
        const END_OF_CAPTURE = 1 << 3;
        const ARBITRATION_LOST = 1 << 4;
        const BUS_ERROR = 1 << 5;
    }
}

/// Adapter bit → decoded flag. `OK` is derived from the whole mask instead.
const STATUS_TABLE: [(u32, StatusFlags); 5] = [
    (status_bits::TIMEOUT, StatusFlags::TIMEOUT),
    (status_bits::ERR_OVERFLOW, StatusFlags::OVERFLOW),
    (status_bits::END_OF_CAPTURE, StatusFlags::END_OF_CAPTURE),
    (status_bits::CAN_ARB_LOST, StatusFlags::ARBITRATION_LOST),
    (status_bits::CAN_ERR, StatusFlags::BUS_ERROR),
];

/// One decoded status condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StatusFlag {
    Ok,
    Timeout,
    Overflow,
    EndOfCapture,
    ArbitrationLost,
    /// Bus error with the adapter's masked error code.
    BusError(u8),
}

impl fmt::Display for StatusFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFlag::Ok => f.write_str("OK"),
            StatusFlag::Timeout => f.write_str("TIMEOUT"),
            StatusFlag::Overflow => f.write_str("OVERFLOW"),
            StatusFlag::EndOfCapture => f.write_str("END_OF_CAPTURE"),
            StatusFlag::ArbitrationLost => f.write_str("ARBITRATION_LOST"),
            StatusFlag::BusError(code) => write!(f, "BUS_ERROR 0x{:x}", code),
        }
    }
}

/// Set of status conditions decoded from one read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusSet {
    flags: StatusFlags,
    bus_error_code: u8,
}

impl StatusSet {
    /// Raw decoded flags.
    #[inline]
    pub fn flags(&self) -> StatusFlags {
        self.flags
    }

    /// `true` when the set is exactly `{OK}`.
    #[inline]
    pub fn is_ok(&self) -> bool {
        self.flags == StatusFlags::OK
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    #[inline]
    pub fn contains(&self, flags: StatusFlags) -> bool {
        self.flags.contains(flags)
    }

    /// Error code carried by the BUS_ERROR flag, when present.
    pub fn bus_error_code(&self) -> Option<u8> {
        self.flags
            .contains(StatusFlags::BUS_ERROR)
            .then_some(self.bus_error_code)
    }

    /// Iterate over the decoded conditions in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = StatusFlag> {
        let flags = self.flags;
        [
            (StatusFlags::OK, StatusFlag::Ok),
            (StatusFlags::TIMEOUT, StatusFlag::Timeout),
            (StatusFlags::OVERFLOW, StatusFlag::Overflow),
            (StatusFlags::END_OF_CAPTURE, StatusFlag::EndOfCapture),
            (StatusFlags::ARBITRATION_LOST, StatusFlag::ArbitrationLost),
            (
                StatusFlags::BUS_ERROR,
                StatusFlag::BusError(self.bus_error_code),
            ),
        ]
        .into_iter()
        .filter(move |(flag, _)| flags.contains(*flag))
        .map(|(_, item)| item)
    }
}

/// Decode a raw status mask into the set of every condition it carries.
///
/// Unknown bits are ignored; a mask with only unknown bits decodes to an
/// empty set (it is neither OK nor a known condition).
///
/// # Example
///
/// ```
/// use can_mitm::protocol::decode::{decode_status, StatusFlags};
///
/// let set = decode_status(0x0100 | 0x0800 | 0x1F);
/// assert!(set.contains(StatusFlags::TIMEOUT | StatusFlags::BUS_ERROR));
/// assert_eq!(set.bus_error_code(), Some(0x1F));
/// ```
pub fn decode_status(raw: u32) -> StatusSet {
    if raw == status_bits::OK {
        return StatusSet {
            flags: StatusFlags::OK,
            bus_error_code: 0,
        };
    }

    let flags = STATUS_TABLE
        .iter()
        .filter(|(bit, _)| raw & bit != 0)
        .fold(StatusFlags::empty(), |acc, (_, flag)| acc | *flag);

    let bus_error_code = if flags.contains(StatusFlags::BUS_ERROR) {
        (raw & status_bits::CAN_ERR_FULL_MASK) as u8
    } else {
        0
    };

    StatusSet {
        flags,
        bus_error_code,
    }
}
