//! Capture → classify → tamper → forward loop.
//!
//! The loop owns both adapters for the whole session and runs a single
//! control flow: one read, its classification, at most one write and one
//! report per iteration, strictly in arrival order.
//!
//! Failure handling is asymmetric:
//! - a failed read means one missed bus event; it is reported and the loop
//!   moves on;
//! - a failed write leaves the egress channel in an unknown state; the loop
//!   stops immediately and the error is returned to the caller.
//!
//! Frames disqualified by a status condition or an event are not errors:
//! they are reported and counted but never forwarded.
use crate::config::RelayConfig;
use crate::error::{ConfigError, ReadError, RelayError};
use crate::infra::timestamp::{to_nanoseconds, validate_sample_rate};
use crate::protocol::decode::{decode_events, decode_status};
use crate::protocol::report::{ReportOutcome, ReportRecord};
use crate::protocol::tamper::ModificationPolicy;
use crate::protocol::transport::capture::Capture;
use crate::protocol::transport::traits::{
    frame_sink::FrameSink, frame_source::FrameSource, report_sink::ReportSink,
};
use core::future::Future;
use embassy_time::Duration;
use futures_util::future::{select, Either};
use futures_util::pin_mut;

//==================================================================================STATE
/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopReason {
    /// `max_events` frames were processed.
    FrameBudgetReached,
    /// The external cancel signal fired (unbounded or early-stopped sessions).
    Cancelled,
    /// The egress adapter refused a frame.
    FatalWriteError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RelayState {
    Running,
    Stopped(StopReason),
}

/// Result of a single iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Step {
    Continue,
    Stopped(StopReason),
}

/// Session counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RelayCounters {
    /// Completed iterations, whatever their outcome.
    pub processed: u64,
    /// Frames written to the egress channel.
    pub forwarded: u64,
    /// Captured frames disqualified by a status condition or an event.
    pub skipped: u64,
    /// Failed ingress reads.
    pub read_errors: u64,
}

/// Returned when a session ends without a fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RelaySummary {
    pub reason: StopReason,
    pub counters: RelayCounters,
}

//==================================================================================RELAY_LOOP
/// Relay session between an ingress [`FrameSource`] and an egress [`FrameSink`].
pub struct RelayLoop<S, K, P, R> {
    source: S,
    sink: K,
    policy: P,
    reporter: R,
    max_events: u64,
    sample_rate_khz: u32,
    read_timeout: Duration,
    counters: RelayCounters,
    state: RelayState,
}

impl<S, K, P, R> RelayLoop<S, K, P, R>
where
    S: FrameSource,
    K: FrameSink,
    P: ModificationPolicy,
    R: ReportSink,
{
    /// Take ownership of both adapters for the session.
    ///
    /// `sample_rate_khz` is the ingress adapter's timestamp clock; it must be
    /// at least 1000 kHz.
    pub fn new(
        source: S,
        sink: K,
        policy: P,
        reporter: R,
        config: &RelayConfig,
        sample_rate_khz: u32,
    ) -> Result<Self, ConfigError> {
        validate_sample_rate(sample_rate_khz)
            .map_err(|_| ConfigError::SampleRateTooLow { sample_rate_khz })?;
        Ok(Self {
            source,
            sink,
            policy,
            reporter,
            max_events: config.max_events(),
            sample_rate_khz,
            read_timeout: config.read_timeout(),
            counters: RelayCounters::default(),
            state: RelayState::Running,
        })
    }

    #[inline]
    pub fn counters(&self) -> RelayCounters {
        self.counters
    }

    #[inline]
    pub fn state(&self) -> RelayState {
        self.state
    }

    /// Give the adapters back (for closing them).
    pub fn into_parts(self) -> (S, K) {
        (self.source, self.sink)
    }

    /// Run until the frame budget is exhausted or a write fails.
    ///
    /// With `max_events == 0` this never returns on its own; use
    /// [`run_until`](Self::run_until) to stop it from the outside.
    pub async fn run(&mut self) -> Result<RelaySummary, RelayError> {
        self.log_start();
        loop {
            if let Step::Stopped(reason) = self.step().await? {
                return Ok(self.finish(reason));
            }
        }
    }

    /// Like [`run`](Self::run), but stops with [`StopReason::Cancelled`] once
    /// `cancel` completes.
    ///
    /// The signal is only observed while the loop waits for a read. Once a
    /// capture has arrived its iteration runs to completion (write, report,
    /// counters), so every forwarded frame is also reported and counted.
    pub async fn run_until<F: Future>(&mut self, cancel: F) -> Result<RelaySummary, RelayError> {
        self.log_start();
        pin_mut!(cancel);
        loop {
            if let Some(reason) = self.check_budget() {
                return Ok(self.finish(reason));
            }

            let read = {
                let read = self.source.read(self.read_timeout);
                pin_mut!(read);
                match select(read, cancel.as_mut()).await {
                    Either::Left((read, _)) => Some(read),
                    Either::Right(_) => None,
                }
            };

            match read {
                Some(read) => {
                    self.process(read).await?;
                }
                None => {
                    self.state = RelayState::Stopped(StopReason::Cancelled);
                    return Ok(self.finish(StopReason::Cancelled));
                }
            }
        }
    }

    /// Perform one iteration.
    ///
    /// Once stopped, the loop never touches the adapters again and keeps
    /// returning the stop reason.
    pub async fn step(&mut self) -> Result<Step, RelayError> {
        // Step 1: budget check.
        if let Some(reason) = self.check_budget() {
            return Ok(Step::Stopped(reason));
        }

        // Step 2: read.
        let read = self.source.read(self.read_timeout).await;
        self.process(read).await
    }

    fn log_start(&self) {
        #[cfg(feature = "defmt")]
        defmt::info!(
            "Relay started: max_events={}, sample_rate={} kHz",
            self.max_events,
            self.sample_rate_khz
        );
    }

    fn finish(&self, reason: StopReason) -> RelaySummary {
        #[cfg(feature = "defmt")]
        defmt::info!("Relay stopped: {}, {}", reason, self.counters);
        RelaySummary {
            reason,
            counters: self.counters,
        }
    }

    /// Stop reason when no further read may happen.
    fn check_budget(&mut self) -> Option<StopReason> {
        if let RelayState::Stopped(reason) = self.state {
            return Some(reason);
        }
        if self.max_events != 0 && self.counters.processed >= self.max_events {
            self.state = RelayState::Stopped(StopReason::FrameBudgetReached);
            return Some(StopReason::FrameBudgetReached);
        }
        None
    }

    /// Saturates instead of failing; the rate was validated in `new`.
    fn timestamp_ns(&self, ticks: u64) -> u64 {
        to_nanoseconds(ticks, self.sample_rate_khz).unwrap_or(u64::MAX)
    }

    /// Classify, forward and report the outcome of one read.
    async fn process(&mut self, read: Result<Capture, ReadError>) -> Result<Step, RelayError> {
        let index = self.counters.processed;

        // A rejected capture still carries its metadata and keeps its timestamp.
        let (read, timestamp_ns) = match read {
            Ok(capture) => (
                Capture::checked(capture.frame, capture.meta),
                self.timestamp_ns(capture.meta.timestamp),
            ),
            Err(err) => (Err(err), 0),
        };
        let capture = match read {
            Ok(capture) => capture,
            Err(err) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("Read {} failed: code {}", index, err.code);
                let record = ReportRecord {
                    index,
                    timestamp_ns,
                    outcome: ReportOutcome::ReadFailed { code: err.code },
                };
                self.reporter.report(&record).await;
                self.counters.read_errors += 1;
                self.counters.processed += 1;
                return Ok(Step::Continue);
            }
        };

        // Step 3: decode.
        let status = decode_status(capture.meta.status);
        let events = decode_events(capture.meta.events, capture.meta.bitrate_hz);

        // Step 4: eligibility.
        let outcome = if status.is_ok() && events.is_empty() {
            let received = capture.frame;
            let mut sent = received;

            // Step 5: remote frames have no data to tamper with.
            if !sent.remote {
                #[cfg(feature = "defmt")]
                defmt::debug!("Tampering frame {:x}", sent.raw_id());
                self.policy.apply(sent.payload_mut());
            }

            // Step 6: a failed write ends the session.
            if let Err(err) = self.sink.write(&sent).await {
                #[cfg(feature = "defmt")]
                defmt::error!("Egress write failed: code {}", err.code);
                self.state = RelayState::Stopped(StopReason::FatalWriteError);
                let record = ReportRecord {
                    index,
                    timestamp_ns,
                    outcome: ReportOutcome::WriteFailed {
                        status,
                        events,
                        received,
                        code: err.code,
                    },
                };
                self.reporter.report(&record).await;
                return Err(RelayError::Write {
                    code: err.code,
                    counters: self.counters,
                });
            }

            self.counters.forwarded += 1;
            ReportOutcome::Forwarded {
                status,
                events,
                received,
                sent,
            }
        } else {
            #[cfg(feature = "defmt")]
            defmt::trace!(
                "Frame {} skipped: status={:#x}, events={:#x}",
                index,
                capture.meta.status,
                capture.meta.events
            );
            self.counters.skipped += 1;
            ReportOutcome::Skipped { status, events }
        };

        // Step 7: report and count.
        let record = ReportRecord {
            index,
            timestamp_ns,
            outcome,
        };
        self.reporter.report(&record).await;
        self.counters.processed += 1;
        Ok(Step::Continue)
    }
}
