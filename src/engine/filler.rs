use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use std::sync::Arc;

use crate::core::{Event, EventProcessor, Pulse};
use crate::io::PulseSource;

/// Attaches the stored pulses inside an event's time range
pub struct PulseFiller {
    source: Arc<dyn PulseSource>,
}

impl PulseFiller {
    pub fn new(source: Arc<dyn PulseSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl EventProcessor for PulseFiller {
    fn name(&self) -> &str {
        "filler"
    }

    async fn process(&self, mut event: Event) -> Result<Event> {
        let range = event.range()?;
        let raw = self.source.fetch_pulses(range).await?;
        debug!(
            "Building event {} in range [{}, {}] ns from {} pulses",
            event.event_number,
            range.start(),
            range.stop(),
            raw.len()
        );

        event.pulses = raw
            .iter()
            .map(|p| Pulse::from_raw(p, event.start_time, event.sample_duration))
            .collect::<crate::Result<Vec<_>>>()?;
        Ok(event)
    }
}
