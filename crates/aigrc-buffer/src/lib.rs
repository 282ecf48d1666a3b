//! # aigrc-buffer
//!
//! Producer-side best-effort buffering (C9): size/time/criticality flush
//! triggers over a single-writer, drain-by-swap internal list.

pub mod buffer;
pub mod error;

pub use buffer::{BufferConfig, Lifecycle, ProducerBuffer};
pub use error::BufferError;
