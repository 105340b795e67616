//! Destination for the per-frame report records.
use crate::protocol::report::ReportRecord;
use futures_util::Future;

/// Receives one record per processed frame, in processing order.
pub trait ReportSink {
    fn report<'a>(&'a mut self, record: &'a ReportRecord) -> impl Future<Output = ()> + 'a;
}
