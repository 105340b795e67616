//! A single successful read: the captured frame and its metadata.
use crate::core::{CaptureMetadata, READ_ERR_INVALID_LENGTH};
use crate::error::ReadError;
use crate::protocol::transport::can_frame::CanFrame;

/// Frame and metadata produced by one read. Owned by the loop iteration that
/// pulled it and dropped at the end of that iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capture {
    pub frame: CanFrame,
    pub meta: CaptureMetadata,
}

impl Capture {
    /// Pair a frame with its metadata, rejecting negative read codes and
    /// frames longer than 8 bytes.
    ///
    /// A negative `meta.result` is always an error, whatever the status bits say.
    pub fn checked(frame: CanFrame, meta: CaptureMetadata) -> Result<Self, ReadError> {
        if meta.result < 0 {
            return Err(ReadError { code: meta.result });
        }
        if !frame.has_valid_len() {
            return Err(ReadError {
                code: READ_ERR_INVALID_LENGTH,
            });
        }
        Ok(Self { frame, meta })
    }
}
