//! In-memory representation of a classic CAN frame as captured on the
//! ingress channel and written to the egress channel.
use crate::core::MAX_PAYLOAD_LEN;
use embedded_can::{ExtendedId, Id, StandardId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Raw CAN frame (data or remote request).
pub struct CanFrame {
    /// Standard (11-bit) or extended (29-bit) identifier.
    pub id: Id,
    /// Remote transmission request: the frame asks for data instead of carrying it.
    pub remote: bool,
    /// Payload buffer. Only the first `len` bytes are meaningful for data frames.
    pub data: [u8; MAX_PAYLOAD_LEN],
    /// Data Length Code (0 to 8). For remote frames, the requested length.
    pub len: usize,
}

impl CanFrame {
    /// Identifier as a plain integer, regardless of its width.
    pub fn raw_id(&self) -> u32 {
        match self.id {
            Id::Standard(id) => id.as_raw() as u32,
            Id::Extended(id) => id.as_raw(),
        }
    }

    /// `true` when `len` fits the payload buffer.
    #[inline]
    pub fn has_valid_len(&self) -> bool {
        self.len <= MAX_PAYLOAD_LEN
    }

    /// Payload bytes; empty for remote frames. An out-of-range `len` is
    /// clamped to the buffer.
    pub fn payload(&self) -> &[u8] {
        if self.remote {
            &[]
        } else {
            &self.data[..self.len.min(MAX_PAYLOAD_LEN)]
        }
    }

    /// Mutable view over the payload; empty for remote frames.
    pub fn payload_mut(&mut self) -> &mut [u8] {
        if self.remote {
            &mut []
        } else {
            &mut self.data[..self.len.min(MAX_PAYLOAD_LEN)]
        }
    }

    /// Build a frame from a raw identifier, picking the standard form when it fits.
    pub fn from_raw_id(raw_id: u32, remote: bool, data: &[u8]) -> Option<Self> {
        let id: Id = match u16::try_from(raw_id).ok().and_then(StandardId::new) {
            Some(standard) => standard.into(),
            None => ExtendedId::new(raw_id)?.into(),
        };
        if remote {
            <Self as embedded_can::Frame>::new_remote(id, data.len())
        } else {
            <Self as embedded_can::Frame>::new(id, data)
        }
    }
}

impl embedded_can::Frame for CanFrame {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        if data.len() > MAX_PAYLOAD_LEN {
            return None;
        }
        let mut buffer = [0u8; MAX_PAYLOAD_LEN];
        buffer[..data.len()].copy_from_slice(data);
        Some(Self {
            id: id.into(),
            remote: false,
            data: buffer,
            len: data.len(),
        })
    }

    fn new_remote(id: impl Into<Id>, dlc: usize) -> Option<Self> {
        if dlc > MAX_PAYLOAD_LEN {
            return None;
        }
        Some(Self {
            id: id.into(),
            remote: true,
            data: [0; MAX_PAYLOAD_LEN],
            len: dlc,
        })
    }

    fn is_extended(&self) -> bool {
        matches!(self.id, Id::Extended(_))
    }

    fn is_remote_frame(&self) -> bool {
        self.remote
    }

    fn id(&self) -> Id {
        self.id
    }

    fn dlc(&self) -> usize {
        self.len
    }

    fn data(&self) -> &[u8] {
        self.payload()
    }
}

//==================================================================================TESTS
#[cfg(test)]
#[path = "tests.rs"]
mod tests;
