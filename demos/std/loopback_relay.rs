//! # Loopback Relay Example
//!
//! Runs the relay tool end to end against a simulated pair of adapters:
//! - Parse `TARGET_PWR NUM_EVENTS`
//! - Open and configure both adapters
//! - Print the report stream on stdout until the budget is spent (or Ctrl-C)
//!
//! The ingress adapter replays a short synthetic traffic pattern (clean
//! frames, a remote request, a read timeout and a GPIO change); frames
//! written to the egress adapter are echoed on stderr.
//!
//! ```bash
//! cargo run --example loopback_relay -- 1 12
//! ```

use can_mitm::cli::{RelayArgs, EXIT_FAILURE, EXIT_SUCCESS, USAGE};
use can_mitm::core::{event_bits, status_bits, CaptureMetadata};
use can_mitm::error::{ReadError, WriteError};
use can_mitm::protocol::report::{ReportRecord, REPORT_HEADER};
use can_mitm::protocol::setup::{
    close_pair, establish, AdapterDriver, CanAdapter, CanChannel, Features, PinBias, PinTrigger,
};
use can_mitm::protocol::tamper::DeadBeef;
use can_mitm::protocol::transport::can_frame::CanFrame;
use can_mitm::protocol::transport::capture::Capture;
use can_mitm::protocol::transport::traits::{
    frame_sink::FrameSink, frame_source::FrameSource, report_sink::ReportSink,
};
use embassy_time::Duration;

/// Timestamp clock of the simulated adapters (48 MHz).
const SAMPLE_RATE_HZ: u32 = 48_000_000;
/// Ticks between two simulated captures (1 ms).
const TICKS_PER_CAPTURE: u64 = 48_000;

// ======================================================================
// Simulated adapters
// ======================================================================

struct SimulatedDriver;

impl AdapterDriver for SimulatedDriver {
    type Handle = SimulatedAdapter;

    fn open(&mut self, port: u8) -> Result<SimulatedAdapter, i32> {
        eprintln!("[setup] open port {}", port);
        Ok(SimulatedAdapter {
            port,
            ticks: 0,
            sequence: 0,
        })
    }
}

struct SimulatedAdapter {
    port: u8,
    ticks: u64,
    sequence: usize,
}

impl SimulatedAdapter {
    /// Next capture of the synthetic traffic pattern.
    fn next_capture(&mut self) -> Capture {
        let n = self.sequence;
        self.sequence += 1;
        self.ticks += TICKS_PER_CAPTURE;

        let counter = (n & 0xFF) as u8;
        let (frame, status, events) = match n % 6 {
            0 => (frame(0x123, false, &[counter, 1, 2, 3, 4, 5, 6, 7]), status_bits::OK, 0),
            1 => (frame(0x18FF_1234, false, &[0x10, 0x20, counter]), status_bits::OK, 0),
            2 => (frame(0x7DF, true, &[0; 8]), status_bits::OK, 0),
            3 => (frame(0, false, &[]), status_bits::TIMEOUT, 0),
            4 => (
                frame(0x456, false, &[counter; 4]),
                status_bits::OK,
                event_bits::DIGITAL_INPUT | 0x04,
            ),
            _ => (frame(0x321, false, &[0xAA, 0xBB]), status_bits::OK, 0),
        };
        Capture {
            frame,
            meta: CaptureMetadata {
                timestamp: self.ticks,
                status,
                events,
                bitrate_hz: 125_000,
                result: frame.len as i32,
            },
        }
    }
}

fn frame(id: u32, remote: bool, data: &[u8]) -> CanFrame {
    CanFrame::from_raw_id(id, remote, data).expect("29-bit identifier")
}

impl CanAdapter for SimulatedAdapter {
    fn enable(&mut self) -> Result<(), i32> {
        eprintln!("[setup] port {}: enabled", self.port);
        Ok(())
    }

    fn acquire(&mut self, features: Features) -> Result<Features, i32> {
        eprintln!("[setup] port {}: acquired {:?}", self.port, features);
        Ok(features)
    }

    fn sample_rate_hz(&mut self) -> u32 {
        SAMPLE_RATE_HZ
    }

    fn set_bitrate(&mut self, channel: CanChannel, bitrate_hz: u32) -> Result<u32, i32> {
        eprintln!(
            "[setup] port {}: bitrate on {:?} set to {} kHz",
            self.port,
            channel,
            bitrate_hz / 1000
        );
        Ok(bitrate_hz)
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), i32> {
        eprintln!("[setup] port {}: timeout {} ms", self.port, timeout.as_millis());
        Ok(())
    }

    fn set_target_power(&mut self, channel: CanChannel, on: bool) -> Result<(), i32> {
        eprintln!(
            "[setup] port {}: target power on {:?} {}",
            self.port,
            channel,
            if on { "ON" } else { "OFF" }
        );
        Ok(())
    }

    fn configure_gpio_input(
        &mut self,
        _pin: u8,
        _bias: PinBias,
        _trigger: PinTrigger,
    ) -> Result<(), i32> {
        Ok(())
    }

    fn close(self) {
        eprintln!("[teardown] port {} closed", self.port);
    }
}

impl FrameSource for SimulatedAdapter {
    async fn read<'a>(&'a mut self, _timeout: Duration) -> Result<Capture, ReadError> {
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        Ok(self.next_capture())
    }
}

impl FrameSink for SimulatedAdapter {
    async fn write<'a>(&'a mut self, frame: &'a CanFrame) -> Result<(), WriteError> {
        eprint!("[egress] {:x}:", frame.raw_id());
        for byte in frame.payload() {
            eprint!(" {:02x}", byte);
        }
        eprintln!();
        Ok(())
    }
}

// ======================================================================
// Report stream
// ======================================================================

struct StdoutReporter;

impl ReportSink for StdoutReporter {
    async fn report<'a>(&'a mut self, record: &'a ReportRecord) {
        println!("{}", record);
    }
}

// ======================================================================
// Entry point
// ======================================================================

#[tokio::main]
async fn main() {
    std::process::exit(run().await);
}

async fn run() -> i32 {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let args = match RelayArgs::parse(args.iter().map(String::as_str)) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{}\n", err);
            eprint!("{}", USAGE);
            return EXIT_FAILURE;
        }
    };
    let config = match args.to_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Invalid configuration: {}", err);
            return EXIT_FAILURE;
        }
    };

    let mut driver = SimulatedDriver;
    let session = match establish(&mut driver, &config) {
        Ok(session) => session,
        Err(err) => {
            eprintln!("Setup failed: {}", err);
            return EXIT_FAILURE;
        }
    };

    let mut relay = match session.into_relay(DeadBeef, StdoutReporter) {
        Ok(relay) => relay,
        Err(err) => {
            eprintln!("Setup failed: {}", err);
            return EXIT_FAILURE;
        }
    };

    println!("{}", REPORT_HEADER);
    let status = match relay.run_until(tokio::signal::ctrl_c()).await {
        Ok(summary) => {
            eprintln!(
                "[relay] stopped ({:?}): {} processed, {} forwarded, {} skipped, {} read errors",
                summary.reason,
                summary.counters.processed,
                summary.counters.forwarded,
                summary.counters.skipped,
                summary.counters.read_errors
            );
            EXIT_SUCCESS
        }
        Err(err) => {
            eprintln!("[relay] {}", err);
            EXIT_FAILURE
        }
    };

    let (ingress, egress) = relay.into_parts();
    close_pair(ingress, egress);
    status
}
