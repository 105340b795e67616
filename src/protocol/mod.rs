//! Relay components: CAN transport, status/event decoding, payload
//! tampering, the relay loop, reporting and one-time adapter setup.
pub mod decode;
pub mod relay;
pub mod report;
pub mod setup;
pub mod tamper;
pub mod transport;
