//! `can-mitm` library: a man-in-the-middle relay between two CAN channels,
//! usable in a `no_std` environment. Frames captured on the ingress channel
//! are classified from the adapter's status and event bits; clean frames go
//! through a pluggable modification policy and are written to the egress
//! channel, everything else is only reported.
#![no_std]
//==================================================================================
/// Command-line surface (`TARGET_PWR NUM_EVENTS`) without `std`.
pub mod cli;
/// Relay session configuration and its builder.
pub mod config;
/// Capture metadata and the adapter's raw bit layout.
pub mod core;
/// Errors for timestamps, bus I/O, relay termination, configuration, setup and usage.
pub mod error;
/// Pure helpers (timestamp conversion).
pub mod infra;
/// Transport types and traits, decoders, tampering, relay loop, reporting and adapter setup.
pub mod protocol;
//==================================================================================
