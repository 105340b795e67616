//! Payload modification policies applied to eligible data frames before
//! they are forwarded to the egress channel.
//!
//! A policy receives the payload as a mutable slice over a per-read copy, so
//! it cannot change the length and never aliases a buffer from a previous
//! iteration. It must not perform I/O.

/// Pattern written by [`DeadBeef`].
pub const DEADBEEF: [u8; 4] = [0xDE, 0xAD, 0xBE, 0xEF];

/// Length-preserving transform of an inbound payload.
pub trait ModificationPolicy {
    /// Rewrite `payload` in place.
    fn apply(&self, payload: &mut [u8]);
}

/// Any `Fn(&mut [u8])` can be used as a policy.
impl<F: Fn(&mut [u8])> ModificationPolicy for F {
    fn apply(&self, payload: &mut [u8]) {
        self(payload)
    }
}

//==================================================================================DEFAULT_POLICIES
/// Overwrites the first four bytes (those that exist) with `DE AD BE EF`.
///
/// # Example
///
/// ```
/// use can_mitm::protocol::tamper::{DeadBeef, ModificationPolicy};
///
/// let mut payload = [1, 2, 3, 4, 5, 6];
/// DeadBeef.apply(&mut payload);
/// assert_eq!(payload, [0xDE, 0xAD, 0xBE, 0xEF, 5, 6]);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DeadBeef;

impl ModificationPolicy for DeadBeef {
    fn apply(&self, payload: &mut [u8]) {
        OverwritePrefix::new(DEADBEEF).apply(payload)
    }
}

/// Overwrites the leading bytes of the payload with a fixed pattern,
/// truncating the pattern to the payload length.
#[derive(Debug, Clone, Copy)]
pub struct OverwritePrefix<const N: usize> {
    pattern: [u8; N],
}

impl<const N: usize> OverwritePrefix<N> {
    pub const fn new(pattern: [u8; N]) -> Self {
        Self { pattern }
    }
}

impl<const N: usize> ModificationPolicy for OverwritePrefix<N> {
    fn apply(&self, payload: &mut [u8]) {
        let n = payload.len().min(N);
        payload[..n].copy_from_slice(&self.pattern[..n]);
    }
}

/// Forwards payloads untouched (pure relay, no tampering).
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl ModificationPolicy for Passthrough {
    fn apply(&self, _payload: &mut [u8]) {}
}
