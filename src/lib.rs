//! Event reconstruction for a detector data-acquisition pipeline.
//!
//! Pulse times are clustered into events, each event's summed waveform is
//! split into peaks, and the work is spread over parallel workers whose
//! output is put back into the original event order.

pub mod clustering;
pub mod core;
pub mod dispatch;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod io;
pub mod observability;
pub mod resilience;

pub use error::{Error, Result};
