//! Per-frame report records and their line rendering.
//!
//! Each processed frame produces one [`ReportRecord`]. The record is a plain
//! value; [`fmt::Display`] renders it as one CSV-like line:
//!
//! ```text
//! <index>,<timestamp_ns>,(<status and event tokens>)[,<id:rtr|data> <hex bytes>]
//! <index>,<timestamp_ns>,(error=<code>)
//! ```
//!
//! The `<id:...>` segment only appears for frames that were eligible for
//! forwarding. Payload bytes are the bytes as received, before tampering.
use crate::protocol::decode::{EventSet, StatusSet};
use crate::protocol::transport::can_frame::CanFrame;
use crate::protocol::transport::traits::report_sink::ReportSink;
use core::fmt;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Sender;

/// Column description printed once before the first record.
pub const REPORT_HEADER: &str = "index,time(ns),(status & events),<id:rtr/data> hex data";

//==================================================================================RECORD
/// What happened to the frame of one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    /// The read itself failed; no frame was captured.
    ReadFailed { code: i32 },
    /// Captured but disqualified by a status condition or an event.
    Skipped { status: StatusSet, events: EventSet },
    /// Eligible and written to the egress channel.
    Forwarded {
        status: StatusSet,
        events: EventSet,
        /// Frame as received on the ingress channel.
        received: CanFrame,
        /// Frame as written on the egress channel.
        sent: CanFrame,
    },
    /// Eligible, but the egress write failed. Ends the session.
    WriteFailed {
        status: StatusSet,
        events: EventSet,
        received: CanFrame,
        code: i32,
    },
}

/// One line of the report stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportRecord {
    /// Iteration index (number of frames processed before this one).
    pub index: u64,
    /// Capture time in nanoseconds; `0` when the read returned no metadata.
    pub timestamp_ns: u64,
    pub outcome: ReportOutcome,
}

impl ReportRecord {
    /// Frame that was captured, when the read succeeded.
    pub fn received(&self) -> Option<&CanFrame> {
        match &self.outcome {
            ReportOutcome::Forwarded { received, .. }
            | ReportOutcome::WriteFailed { received, .. } => Some(received),
            _ => None,
        }
    }

    /// `true` when the frame reached the egress channel.
    pub fn is_forwarded(&self) -> bool {
        matches!(self.outcome, ReportOutcome::Forwarded { .. })
    }
}

/// Space-separated status tokens followed by event tokens.
fn write_conditions(
    f: &mut fmt::Formatter<'_>,
    status: &StatusSet,
    events: &EventSet,
) -> fmt::Result {
    let mut first = true;
    for token in status.iter() {
        if !first {
            f.write_str(" ")?;
        }
        write!(f, "{}", token)?;
        first = false;
    }
    for token in events.iter() {
        if !first {
            f.write_str(" ")?;
        }
        write!(f, "{}", token)?;
        first = false;
    }
    Ok(())
}

/// `<id:rtr>` or `<id:data>` followed by the payload bytes.
fn write_frame(f: &mut fmt::Formatter<'_>, frame: &CanFrame) -> fmt::Result {
    if frame.remote {
        return write!(f, "<{:x}:rtr>", frame.raw_id());
    }
    write!(f, "<{:x}:data>", frame.raw_id())?;
    for byte in frame.payload() {
        write!(f, " {:02x}", byte)?;
    }
    Ok(())
}

impl fmt::Display for ReportRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},(", self.index, self.timestamp_ns)?;
        match &self.outcome {
            ReportOutcome::ReadFailed { code } => write!(f, "error={})", code),
            ReportOutcome::Skipped { status, events } => {
                write_conditions(f, status, events)?;
                f.write_str(")")
            }
            ReportOutcome::Forwarded {
                status,
                events,
                received,
                ..
            } => {
                write_conditions(f, status, events)?;
                f.write_str("),")?;
                write_frame(f, received)
            }
            ReportOutcome::WriteFailed {
                status,
                events,
                received,
                code,
            } => {
                write_conditions(f, status, events)?;
                f.write_str("),")?;
                write_frame(f, received)?;
                write!(f, " write_error={}", code)
            }
        }
    }
}

//==================================================================================CHANNEL_REPORTER
/// Report sink pushing records into an [`embassy_sync`] channel, so that a
/// separate task can print or store them.
///
/// `report` waits when the channel is full: records are never dropped.
pub struct ChannelReporter<'a, M: RawMutex, const N: usize> {
    sender: Sender<'a, M, ReportRecord, N>,
}

impl<'a, M: RawMutex, const N: usize> ChannelReporter<'a, M, N> {
    pub fn new(sender: Sender<'a, M, ReportRecord, N>) -> Self {
        Self { sender }
    }
}

impl<M: RawMutex, const N: usize> ReportSink for ChannelReporter<'_, M, N> {
    async fn report<'b>(&'b mut self, record: &'b ReportRecord) {
        self.sender.send(*record).await;
    }
}

/// Sink discarding every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl ReportSink for NullReporter {
    async fn report<'b>(&'b mut self, _record: &'b ReportRecord) {}
}
