//! Test doubles simulating the ingress adapter, the egress adapter, the
//! report stream and the adapter driver during integration tests.
#![allow(dead_code)]

use can_mitm::{
    core::{event_bits, status_bits, CaptureMetadata},
    error::{ReadError, WriteError},
    protocol::{
        report::ReportRecord,
        setup::{AdapterDriver, CanAdapter, CanChannel, Features, PinBias, PinTrigger},
        transport::{
            can_frame::CanFrame,
            capture::Capture,
            traits::{frame_sink::FrameSink, frame_source::FrameSource, report_sink::ReportSink},
        },
    },
};
use embassy_time::Duration;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Sample clock used by the scripted captures (50 MHz: 20 ns per tick).
pub const SAMPLE_RATE_KHZ: u32 = 50_000;

//==================================================================================CAPTURE_BUILDERS
/// Data frame with a standard or extended identifier.
pub fn data_frame(id: u32, data: &[u8]) -> CanFrame {
    CanFrame::from_raw_id(id, false, data).unwrap()
}

/// Remote-request frame asking for `dlc` bytes.
pub fn remote_frame(id: u32, dlc: usize) -> CanFrame {
    CanFrame::from_raw_id(id, true, &[0u8; 8][..dlc]).unwrap()
}

/// Capture with explicit status and event masks.
pub fn capture_with(frame: CanFrame, ticks: u64, status: u32, events: u32) -> Capture {
    Capture {
        frame,
        meta: CaptureMetadata {
            timestamp: ticks,
            status,
            events,
            bitrate_hz: 125_000,
            result: frame.len as i32,
        },
    }
}

/// Clean capture: status OK, no event.
pub fn ok_capture(frame: CanFrame, ticks: u64) -> Capture {
    capture_with(frame, ticks, status_bits::OK, 0)
}

/// Capture flagged TIMEOUT, as delivered when the read timeout expires.
pub fn timeout_capture(ticks: u64) -> Capture {
    capture_with(data_frame(0, &[]), ticks, status_bits::TIMEOUT, 0)
}

/// Clean status but a GPIO change event.
pub fn gpio_capture(frame: CanFrame, ticks: u64, pins: u8) -> Capture {
    capture_with(
        frame,
        ticks,
        status_bits::OK,
        event_bits::DIGITAL_INPUT | pins as u32,
    )
}

//==================================================================================FRAME_SOURCE
/// Ingress adapter replaying a fixed script. Once the script is exhausted the
/// read never completes, like an idle bus with an external cancel.
#[derive(Clone)]
pub struct ScriptedSource {
    script: Arc<Mutex<VecDeque<Result<Capture, ReadError>>>>,
    reads: Arc<AtomicUsize>,
}

impl ScriptedSource {
    pub fn new(script: impl IntoIterator<Item = Result<Capture, ReadError>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into_iter().collect())),
            reads: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of `read` calls that returned.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Captures not consumed yet.
    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap().len()
    }
}

impl FrameSource for ScriptedSource {
    async fn read<'a>(&'a mut self, _timeout: Duration) -> Result<Capture, ReadError> {
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(result) => {
                self.reads.fetch_add(1, Ordering::SeqCst);
                result
            }
            None => std::future::pending().await,
        }
    }
}

//==================================================================================FRAME_SINK
/// Egress adapter forwarding written frames to a channel. Fails with
/// `fail_code` once `accept` writes have succeeded.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<CanFrame>,
    accept: usize,
    fail_code: i32,
}

impl ChannelSink {
    /// Sink accepting every write.
    pub fn create() -> (Self, mpsc::UnboundedReceiver<CanFrame>) {
        Self::failing_after(usize::MAX, 0)
    }

    pub fn failing_after(
        accept: usize,
        fail_code: i32,
    ) -> (Self, mpsc::UnboundedReceiver<CanFrame>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                accept,
                fail_code,
            },
            rx,
        )
    }
}

impl FrameSink for ChannelSink {
    async fn write<'a>(&'a mut self, frame: &'a CanFrame) -> Result<(), WriteError> {
        if self.accept == 0 {
            return Err(WriteError {
                code: self.fail_code,
            });
        }
        self.accept -= 1;
        self.tx.send(*frame).map_err(|_| WriteError { code: -1 })
    }
}

/// Drain every frame written so far.
pub fn drain(rx: &mut mpsc::UnboundedReceiver<CanFrame>) -> Vec<CanFrame> {
    let mut frames = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        frames.push(frame);
    }
    frames
}

//==================================================================================REPORT_SINK
/// Report sink keeping every record in memory.
#[derive(Clone, Default)]
pub struct CollectingReporter {
    records: Arc<Mutex<Vec<ReportRecord>>>,
}

impl CollectingReporter {
    pub fn records(&self) -> Vec<ReportRecord> {
        self.records.lock().unwrap().clone()
    }

    /// Records rendered as report lines.
    pub fn lines(&self) -> Vec<String> {
        self.records().iter().map(ToString::to_string).collect()
    }
}

impl ReportSink for CollectingReporter {
    async fn report<'a>(&'a mut self, record: &'a ReportRecord) {
        self.records.lock().unwrap().push(*record);
    }
}

//==================================================================================ADAPTER_DRIVER
/// Failure injection for [`FakeDriver`].
#[derive(Clone, Copy, Default)]
pub struct Faults {
    pub open_port: Option<(u8, i32)>,
    /// Port whose adapter grants only half the requested features.
    pub partial_grant_port: Option<u8>,
    /// Port whose adapter rejects the feature request with a code.
    pub acquire_port: Option<(u8, i32)>,
    pub enable_port: Option<(u8, i32)>,
    pub sample_rate_hz: Option<u32>,
}

/// Setup calls recorded across every adapter opened by a [`FakeDriver`].
pub type CallLog = Arc<Mutex<Vec<String>>>;

/// In-memory driver handing out [`FakeAdapter`]s.
pub struct FakeDriver {
    pub log: CallLog,
    faults: Faults,
    /// Script for the adapter opened on each port.
    scripts: Vec<(u8, ScriptedSource)>,
    sinks: Vec<(u8, mpsc::UnboundedSender<CanFrame>)>,
}

impl FakeDriver {
    pub fn new(faults: Faults) -> Self {
        Self {
            log: Arc::new(Mutex::new(Vec::new())),
            faults,
            scripts: Vec::new(),
            sinks: Vec::new(),
        }
    }

    /// Captures delivered by the adapter on `port`.
    pub fn with_script(mut self, port: u8, source: ScriptedSource) -> Self {
        self.scripts.push((port, source));
        self
    }

    /// Channel receiving the frames written through the adapter on `port`.
    pub fn with_sink(mut self, port: u8) -> (Self, mpsc::UnboundedReceiver<CanFrame>) {
        let (tx, rx) = mpsc::unbounded_channel();
        self.sinks.push((port, tx));
        (self, rx)
    }

    pub fn calls(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

impl AdapterDriver for FakeDriver {
    type Handle = FakeAdapter;

    fn open(&mut self, port: u8) -> Result<FakeAdapter, i32> {
        self.log.lock().unwrap().push(format!("open {port}"));
        if let Some((failing, code)) = self.faults.open_port {
            if failing == port {
                return Err(code);
            }
        }
        let source = self
            .scripts
            .iter()
            .find(|(p, _)| *p == port)
            .map(|(_, s)| s.clone())
            .unwrap_or_else(|| ScriptedSource::new(std::iter::empty()));
        let sink = self
            .sinks
            .iter()
            .find(|(p, _)| *p == port)
            .map(|(_, tx)| tx.clone());
        Ok(FakeAdapter {
            port,
            log: self.log.clone(),
            faults: self.faults,
            source,
            sink,
        })
    }
}

/// Adapter recording its setup calls and relaying through the scripted
/// source and channel sink.
pub struct FakeAdapter {
    port: u8,
    log: CallLog,
    faults: Faults,
    source: ScriptedSource,
    sink: Option<mpsc::UnboundedSender<CanFrame>>,
}

impl std::fmt::Debug for FakeAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeAdapter").field("port", &self.port).finish()
    }
}

impl FakeAdapter {
    fn record(&self, call: String) {
        self.log.lock().unwrap().push(call);
    }
}

impl CanAdapter for FakeAdapter {
    fn enable(&mut self) -> Result<(), i32> {
        self.record(format!("enable {}", self.port));
        match self.faults.enable_port {
            Some((port, code)) if port == self.port => Err(code),
            _ => Ok(()),
        }
    }

    fn acquire(&mut self, features: Features) -> Result<Features, i32> {
        self.record(format!("acquire {} {:#x}", self.port, features.bits()));
        if let Some((port, code)) = self.faults.acquire_port {
            if port == self.port {
                return Err(code);
            }
        }
        if self.faults.partial_grant_port == Some(self.port) {
            return Ok(Features::from_bits_truncate(features.bits() & 0x00F));
        }
        Ok(features)
    }

    fn sample_rate_hz(&mut self) -> u32 {
        self.faults
            .sample_rate_hz
            .unwrap_or(SAMPLE_RATE_KHZ * 1000)
    }

    fn set_bitrate(&mut self, channel: CanChannel, bitrate_hz: u32) -> Result<u32, i32> {
        self.record(format!("bitrate {} {:?} {}", self.port, channel, bitrate_hz));
        Ok(bitrate_hz)
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), i32> {
        self.record(format!("timeout {} {}", self.port, timeout.as_millis()));
        Ok(())
    }

    fn set_target_power(&mut self, channel: CanChannel, on: bool) -> Result<(), i32> {
        self.record(format!("power {} {:?} {}", self.port, channel, on));
        Ok(())
    }

    fn configure_gpio_input(
        &mut self,
        pin: u8,
        bias: PinBias,
        trigger: PinTrigger,
    ) -> Result<(), i32> {
        self.record(format!("gpio {} {} {:?} {:?}", self.port, pin, bias, trigger));
        Ok(())
    }

    fn close(self) {
        self.record(format!("close {}", self.port));
    }
}

impl FrameSource for FakeAdapter {
    async fn read<'a>(&'a mut self, timeout: Duration) -> Result<Capture, ReadError> {
        self.source.read(timeout).await
    }
}

impl FrameSink for FakeAdapter {
    async fn write<'a>(&'a mut self, frame: &'a CanFrame) -> Result<(), WriteError> {
        match &self.sink {
            Some(tx) => tx.send(*frame).map_err(|_| WriteError { code: -1 }),
            // Adapter without CAN transmit capability.
            None => Err(WriteError { code: -4 }),
        }
    }
}
