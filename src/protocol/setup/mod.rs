//! One-time adapter setup performed before the relay loop starts.
//!
//! The ingress adapter listens on CAN channel A (and watches its GPIO
//! inputs); the egress adapter transmits on CAN channel B. Setup opens both,
//! claims the features each role needs, programs bitrate, timeout, target
//! power and pins, then enables them. Every failure here is fatal: the relay
//! never starts and already-opened adapters are closed again.
//!
//! Nothing in this module is called once the loop is running; the loop only
//! uses the [`FrameSource`] / [`FrameSink`] side of the handles.
use crate::config::RelayConfig;
use crate::error::{ConfigError, SetupError};
use crate::infra::timestamp::validate_sample_rate;
use crate::protocol::relay::RelayLoop;
use crate::protocol::tamper::ModificationPolicy;
use crate::protocol::transport::traits::{
    frame_sink::FrameSink, frame_source::FrameSource, report_sink::ReportSink,
};
use crate::protocol::transport::NUM_GPIOS;
use bitflags::bitflags;
use embassy_time::Duration;

//==================================================================================FEATURES
bitflags! {
    /// Adapter capabilities that must be acquired before use.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Features: u32 {
        const GPIO_LISTEN = 0x0001;
        const GPIO_CONTROL = 0x0002;
        const GPIO_CONFIG = 0x0004;
        const CAN_A_LISTEN = 0x0008;
        /// Makes the adapter ACK every frame on channel A.
        const CAN_A_CONTROL = 0x0010;
        const CAN_A_CONFIG = 0x0020;
        const CAN_B_LISTEN = 0x0040;
        const CAN_B_CONTROL = 0x0080;
        const CAN_B_CONFIG = 0x0100;
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Features {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Features({=u32:#x})", self.bits())
    }
}

/// Features claimed on the ingress adapter.
pub const INGRESS_FEATURES: Features = Features::CAN_A_CONFIG
    .union(Features::CAN_A_LISTEN)
    .union(Features::CAN_A_CONTROL)
    .union(Features::GPIO_CONFIG)
    .union(Features::GPIO_LISTEN);

/// Features claimed on the egress adapter.
pub const EGRESS_FEATURES: Features = Features::CAN_B_CONFIG.union(Features::CAN_B_CONTROL);

/// CAN channel of an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CanChannel {
    A,
    B,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinBias {
    None,
    PullUp,
    PullDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinTrigger {
    RisingEdge,
    FallingEdge,
    BothEdges,
}

//==================================================================================ADAPTER_TRAITS
/// Setup primitives of an opened adapter. Errors carry the driver's code.
pub trait CanAdapter {
    fn enable(&mut self) -> Result<(), i32>;
    /// Request `features`; returns the subset actually granted.
    fn acquire(&mut self, features: Features) -> Result<Features, i32>;
    /// Timestamp clock frequency (Hz).
    fn sample_rate_hz(&mut self) -> u32;
    /// Program the bitrate; returns the bitrate actually applied.
    fn set_bitrate(&mut self, channel: CanChannel, bitrate_hz: u32) -> Result<u32, i32>;
    fn set_timeout(&mut self, timeout: Duration) -> Result<(), i32>;
    fn set_target_power(&mut self, channel: CanChannel, on: bool) -> Result<(), i32>;
    fn configure_gpio_input(
        &mut self,
        pin: u8,
        bias: PinBias,
        trigger: PinTrigger,
    ) -> Result<(), i32>;
    /// Release the adapter.
    fn close(self);
}

/// Entry point of the adapter driver.
pub trait AdapterDriver {
    type Handle: CanAdapter;
    fn open(&mut self, port: u8) -> Result<Self::Handle, i32>;
}

//==================================================================================SESSION
/// Both adapters, configured and enabled, ready to be handed to the relay.
#[derive(Debug)]
pub struct Session<H> {
    ingress: H,
    egress: H,
    sample_rate_khz: u32,
    config: RelayConfig,
}

/// Open and configure both adapters.
///
/// Order: open ingress, open egress, configure ingress, configure egress,
/// enable ingress, enable egress, read the sample clock. Any failure closes
/// what was opened and is returned as a [`SetupError`].
pub fn establish<D: AdapterDriver>(
    driver: &mut D,
    config: &RelayConfig,
) -> Result<Session<D::Handle>, SetupError> {
    let ingress_port = config.ingress_port();
    let egress_port = config.egress_port();

    let ingress = driver.open(ingress_port).map_err(|code| SetupError::Open {
        port: ingress_port,
        code,
    })?;
    let egress = match driver.open(egress_port) {
        Ok(handle) => handle,
        Err(code) => {
            ingress.close();
            return Err(SetupError::Open {
                port: egress_port,
                code,
            });
        }
    };

    let mut session = Session {
        ingress,
        egress,
        sample_rate_khz: 0,
        config: *config,
    };
    match session.prepare() {
        Ok(()) => Ok(session),
        Err(err) => {
            #[cfg(feature = "defmt")]
            defmt::error!("Adapter setup failed: {}", err);
            session.close();
            Err(err)
        }
    }
}

impl<H: CanAdapter> Session<H> {
    fn prepare(&mut self) -> Result<(), SetupError> {
        let config = self.config;
        configure_ingress(&mut self.ingress, &config)?;
        configure_egress(&mut self.egress, &config)?;

        self.ingress.enable().map_err(|code| SetupError::Enable {
            port: config.ingress_port(),
            code,
        })?;
        self.egress.enable().map_err(|code| SetupError::Enable {
            port: config.egress_port(),
            code,
        })?;

        let sample_rate_khz = self.ingress.sample_rate_hz() / 1000;
        validate_sample_rate(sample_rate_khz)
            .map_err(|_| ConfigError::SampleRateTooLow { sample_rate_khz })?;
        self.sample_rate_khz = sample_rate_khz;
        Ok(())
    }

    /// Timestamp clock of the ingress adapter (kHz).
    #[inline]
    pub fn sample_rate_khz(&self) -> u32 {
        self.sample_rate_khz
    }

    #[inline]
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Hand both adapters over to a relay loop.
    pub fn into_relay<P, R>(
        self,
        policy: P,
        reporter: R,
    ) -> Result<RelayLoop<H, H, P, R>, ConfigError>
    where
        H: FrameSource + FrameSink,
        P: ModificationPolicy,
        R: ReportSink,
    {
        RelayLoop::new(
            self.ingress,
            self.egress,
            policy,
            reporter,
            &self.config,
            self.sample_rate_khz,
        )
    }

    /// Release both adapters.
    pub fn close(self) {
        close_pair(self.ingress, self.egress);
    }
}

/// Release an (ingress, egress) pair, e.g. the one returned by
/// [`RelayLoop::into_parts`].
pub fn close_pair<H: CanAdapter>(ingress: H, egress: H) {
    ingress.close();
    egress.close();
}

/// Check that every requested feature was granted.
fn acquire_all<H: CanAdapter>(
    adapter: &mut H,
    port: u8,
    requested: Features,
) -> Result<Features, SetupError> {
    let granted = adapter
        .acquire(requested)
        .map_err(|code| SetupError::FeatureRequest { port, code })?;
    if !granted.contains(requested) {
        return Err(SetupError::FeatureAcquisition {
            port,
            requested,
            granted,
        });
    }
    #[cfg(feature = "defmt")]
    defmt::info!("Acquired features {} on port {}", granted, port);
    Ok(granted)
}

/// Listening side: channel A, target power, GPIO inputs.
fn configure_ingress<H: CanAdapter>(
    adapter: &mut H,
    config: &RelayConfig,
) -> Result<(), SetupError> {
    let port = config.ingress_port();
    let configure = |code| SetupError::Configure { port, code };

    acquire_all(adapter, port, INGRESS_FEATURES)?;

    let _bitrate = adapter
        .set_bitrate(CanChannel::A, config.bitrate_hz())
        .map_err(configure)?;
    #[cfg(feature = "defmt")]
    defmt::info!("Bitrate set to {} kHz", _bitrate / 1000);

    adapter
        .set_timeout(config.read_timeout())
        .map_err(configure)?;
    #[cfg(feature = "defmt")]
    defmt::info!("Timeout set to {} ms", config.read_timeout().as_millis());

    adapter
        .set_target_power(CanChannel::A, config.target_power())
        .map_err(configure)?;
    #[cfg(feature = "defmt")]
    defmt::info!(
        "Target power {}",
        if config.target_power() { "ON" } else { "OFF" }
    );

    for pin in 0..NUM_GPIOS {
        adapter
            .configure_gpio_input(pin, PinBias::PullUp, PinTrigger::BothEdges)
            .map_err(configure)?;
    }
    #[cfg(feature = "defmt")]
    defmt::info!("All pins set as inputs");
    Ok(())
}

/// Transmitting side: channel B.
fn configure_egress<H: CanAdapter>(
    adapter: &mut H,
    config: &RelayConfig,
) -> Result<(), SetupError> {
    let port = config.egress_port();
    let configure = |code| SetupError::Configure { port, code };

    acquire_all(adapter, port, EGRESS_FEATURES)?;
    adapter
        .set_bitrate(CanChannel::B, config.bitrate_hz())
        .map_err(configure)?;
    adapter
        .set_timeout(config.read_timeout())
        .map_err(configure)?;
    Ok(())
}
