//! # aigrc-client
//!
//! Producer-side HTTP client (C10): retrying, backing off, auto-selecting
//! between the sync and batch ingestion channels per §4.C10.

pub mod client;
pub mod error;

pub use client::{ClientConfig, ProducerClient};
pub use error::ClientError;
