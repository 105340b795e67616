//! Abstraction traits used by the relay: ingress source, egress sink and
//! report sink.
pub mod frame_sink;
pub mod frame_source;
pub mod report_sink;
