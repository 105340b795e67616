//! Egress side of the relay.
use crate::error::WriteError;
use crate::protocol::transport::can_frame::CanFrame;
use futures_util::Future;

/// Contract to transmit frames on the egress channel.
pub trait FrameSink {
    /// Emit a frame. A failure leaves the egress channel in an unknown state.
    fn write<'a>(
        &'a mut self,
        frame: &'a CanFrame,
    ) -> impl Future<Output = Result<(), WriteError>> + 'a;
}
