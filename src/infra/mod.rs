//! Infrastructure helpers with no knowledge of the relay itself.
pub mod timestamp;
