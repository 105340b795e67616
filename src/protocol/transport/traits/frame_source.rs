//! Ingress side of the relay: a blocking-with-timeout read that yields a
//! frame plus the adapter's capture metadata.
use crate::error::ReadError;
use crate::protocol::transport::capture::Capture;
use embassy_time::Duration;
use futures_util::Future;

/// Contract to pull captured frames from the ingress channel.
///
/// `read` resolves once a frame, a status condition or an event is available,
/// and at the latest after `timeout`: an expired timeout is a successful read
/// carrying the TIMEOUT status bit, not an error.
pub trait FrameSource {
    /// Retrieve the next capture.
    ///
    /// Errors carry the adapter's negative read code.
    fn read<'a>(
        &'a mut self,
        timeout: Duration,
    ) -> impl Future<Output = Result<Capture, ReadError>> + 'a;
}
