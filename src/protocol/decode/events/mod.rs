//! Event bitmask decoder.
//!
//! Events are asynchronous bus or adapter conditions delivered alongside a
//! read: GPIO input changes, controller bus-state transitions and bitrate
//! changes. Two of them carry a value:
//!
//! - GPIO change: the pins that changed, taken from bits 0-7 of the mask;
//! - bitrate change: the bitrate in effect when the read was decoded.
use crate::core::event_bits;
use bitflags::bitflags;
use core::fmt;

bitflags! {
    /// Event conditions, independent of the adapter's bit positions.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EventFlags: u8 {
        const GPIO_CHANGE = 1 << 0;
        const BUS_STATE_LISTEN_ONLY = 1 << 1;
        const BUS_STATE_CONTROL = 1 << 2;
        const BUS_STATE_WARNING = 1 << 3;
        const BUS_STATE_ACTIVE = 1 << 4;
        const BUS_STATE_PASSIVE = 1 << 5;
        const BUS_STATE_OFF = 1 << 6;
        const BITRATE_CHANGED = 1 << 7;
    }
}

const EVENT_TABLE: [(u32, EventFlags); 8] = [
    (event_bits::DIGITAL_INPUT, EventFlags::GPIO_CHANGE),
    (event_bits::CAN_BUS_STATE_LISTEN_ONLY, EventFlags::BUS_STATE_LISTEN_ONLY),
    (event_bits::CAN_BUS_STATE_CONTROL, EventFlags::BUS_STATE_CONTROL),
    (event_bits::CAN_BUS_STATE_WARNING, EventFlags::BUS_STATE_WARNING),
    (event_bits::CAN_BUS_STATE_ACTIVE, EventFlags::BUS_STATE_ACTIVE),
    (event_bits::CAN_BUS_STATE_PASSIVE, EventFlags::BUS_STATE_PASSIVE),
    (event_bits::CAN_BUS_STATE_OFF, EventFlags::BUS_STATE_OFF),
    (event_bits::CAN_BUS_BITRATE, EventFlags::BITRATE_CHANGED),
];

/// One decoded event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EventFlag {
    /// GPIO inputs changed; carries the mask of affected pins.
    GpioChange(u8),
    BusStateListenOnly,
    BusStateControl,
    BusStateWarning,
    BusStateActive,
    BusStatePassive,
    BusStateOff,
    /// Bus bitrate changed; carries the new bitrate in Hz.
    BitrateChanged(u32),
}

impl fmt::Display for EventFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventFlag::GpioChange(mask) => write!(f, "GPIO_CHANGE 0x{:x}", mask),
            EventFlag::BusStateListenOnly => f.write_str("BUS_STATE_LISTEN_ONLY"),
            EventFlag::BusStateControl => f.write_str("BUS_STATE_CONTROL"),
            EventFlag::BusStateWarning => f.write_str("BUS_STATE_WARNING"),
            EventFlag::BusStateActive => f.write_str("BUS_STATE_ACTIVE"),
            EventFlag::BusStatePassive => f.write_str("BUS_STATE_PASSIVE"),
            EventFlag::BusStateOff => f.write_str("BUS_STATE_OFF"),
            EventFlag::BitrateChanged(hz) => write!(f, "BITRATE {} kHz", hz / 1000),
        }
    }
}

/// Set of events decoded from one read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventSet {
    flags: EventFlags,
    gpio_mask: u8,
    bitrate_hz: u32,
}

impl EventSet {
    #[inline]
    pub fn flags(&self) -> EventFlags {
        self.flags
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    #[inline]
    pub fn contains(&self, flags: EventFlags) -> bool {
        self.flags.contains(flags)
    }

    /// Pins that changed, when a GPIO event is present.
    pub fn gpio_mask(&self) -> Option<u8> {
        self.flags
            .contains(EventFlags::GPIO_CHANGE)
            .then_some(self.gpio_mask)
    }

    /// New bitrate, when a bitrate event is present.
    pub fn new_bitrate_hz(&self) -> Option<u32> {
        self.flags
            .contains(EventFlags::BITRATE_CHANGED)
            .then_some(self.bitrate_hz)
    }

    /// Iterate over the decoded events in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = EventFlag> {
        let flags = self.flags;
        [
            (EventFlags::GPIO_CHANGE, EventFlag::GpioChange(self.gpio_mask)),
            (EventFlags::BUS_STATE_LISTEN_ONLY, EventFlag::BusStateListenOnly),
            (EventFlags::BUS_STATE_CONTROL, EventFlag::BusStateControl),
            (EventFlags::BUS_STATE_WARNING, EventFlag::BusStateWarning),
            (EventFlags::BUS_STATE_ACTIVE, EventFlag::BusStateActive),
            (EventFlags::BUS_STATE_PASSIVE, EventFlag::BusStatePassive),
            (EventFlags::BUS_STATE_OFF, EventFlag::BusStateOff),
            (
                EventFlags::BITRATE_CHANGED,
                EventFlag::BitrateChanged(self.bitrate_hz),
            ),
        ]
        .into_iter()
        .filter(move |(flag, _)| flags.contains(*flag))
        .map(|(_, item)| item)
    }
}

/// Decode a raw event mask.
///
/// `bitrate_hz` is the bitrate in effect at decode time; it is attached to
/// the BITRATE_CHANGED flag as-is. A zero mask yields an empty set.
pub fn decode_events(raw: u32, bitrate_hz: u32) -> EventSet {
    if raw == 0 {
        return EventSet::default();
    }

    let flags = EVENT_TABLE
        .iter()
        .filter(|(bit, _)| raw & bit != 0)
        .fold(EventFlags::empty(), |acc, (_, flag)| acc | *flag);

    EventSet {
        flags,
        gpio_mask: if flags.contains(EventFlags::GPIO_CHANGE) {
            (raw & event_bits::DIGITAL_INPUT_MASK) as u8
        } else {
            0
        },
        bitrate_hz: if flags.contains(EventFlags::BITRATE_CHANGED) {
            bitrate_hz
        } else {
            0
        },
    }
}
