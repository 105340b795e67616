//! Decoding of the adapter's raw status and event bitmasks into flag sets.
//!
//! Both decoders accumulate: every recognised bit contributes its flag, so a
//! single read may carry several conditions at once. Interpreting the sets
//! (for instance deciding whether a frame may be forwarded) is left to the
//! caller.
pub mod events;
pub mod status;

pub use events::{decode_events, EventFlag, EventFlags, EventSet};
pub use status::{decode_status, StatusFlag, StatusFlags, StatusSet};
