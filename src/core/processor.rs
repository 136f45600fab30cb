use super::Event;
use anyhow::Result;
use async_trait::async_trait;

/// One per-event step run by a reconstruction worker
#[async_trait]
pub trait EventProcessor: Send + Sync {
    /// Stage name used for logging and metrics
    fn name(&self) -> &str;

    /// Take ownership of an event and hand back the transformed one.
    /// Errors are fatal to the worker running this processor.
    async fn process(&self, event: Event) -> Result<Event>;
}
