//! Collaborators at the edges of the pipeline: where pulses come from and
//! where finished events go.

pub mod jsonl;
pub mod memory;

pub use jsonl::JsonLinesSink;
pub use memory::{CollectingSink, MemoryPulseSource};

use anyhow::Result;
use async_trait::async_trait;

use crate::core::{Event, RawPulse, TimeRange};

/// Storage backend supplying raw pulses
#[async_trait]
pub trait PulseSource: Send + Sync {
    /// Whether the acquisition has stopped writing new pulses
    async fn acquisition_ended(&self) -> Result<bool>;

    /// Sorted start times (ns) of all pulses strictly after `after`, or of
    /// every pulse when `after` is `None`
    async fn pulse_times_after(&self, after: Option<i64>) -> Result<Vec<i64>>;

    /// Pulses with `range.start() <= time <= range.stop()`, sorted by time
    async fn fetch_pulses(&self, range: TimeRange) -> Result<Vec<RawPulse>>;
}

/// Persistence backend for completed events
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn write_event(&self, event: &Event) -> Result<()>;
}
