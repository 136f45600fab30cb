use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::{EventSink, PulseSource};
use crate::core::{Event, RawPulse, TimeRange};

/// Pulse store held in memory, kept sorted by time.
///
/// Pulses can be appended while a pipeline is reading, which makes it usable
/// as a stand-in for a live acquisition.
pub struct MemoryPulseSource {
    pulses: Mutex<Vec<RawPulse>>,
    ended: AtomicBool,
}

impl MemoryPulseSource {
    /// A source whose acquisition is still running
    pub fn new() -> Self {
        Self {
            pulses: Mutex::new(Vec::new()),
            ended: AtomicBool::new(false),
        }
    }

    /// A source holding a complete, finished acquisition
    pub fn finished(pulses: Vec<RawPulse>) -> Self {
        let source = Self::new();
        source.append(pulses);
        source.end_acquisition();
        source
    }

    pub fn append(&self, pulses: impl IntoIterator<Item = RawPulse>) {
        let mut stored = self.pulses.lock().unwrap_or_else(|p| p.into_inner());
        stored.extend(pulses);
        stored.sort_by_key(|p| p.time);
    }

    pub fn end_acquisition(&self) {
        self.ended.store(true, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.pulses.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryPulseSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PulseSource for MemoryPulseSource {
    async fn acquisition_ended(&self) -> Result<bool> {
        Ok(self.ended.load(Ordering::SeqCst))
    }

    async fn pulse_times_after(&self, after: Option<i64>) -> Result<Vec<i64>> {
        let pulses = self.pulses.lock().unwrap_or_else(|p| p.into_inner());
        Ok(pulses
            .iter()
            .map(|p| p.time)
            .filter(|&t| after.map_or(true, |a| t > a))
            .collect())
    }

    async fn fetch_pulses(&self, range: TimeRange) -> Result<Vec<RawPulse>> {
        let pulses = self.pulses.lock().unwrap_or_else(|p| p.into_inner());
        Ok(pulses
            .iter()
            .filter(|p| range.contains(p.time))
            .cloned()
            .collect())
    }
}

/// Keeps every written event, in write order
#[derive(Default)]
pub struct CollectingSink {
    events: Mutex<Vec<Event>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EventSink for CollectingSink {
    async fn write_event(&self, event: &Event) -> Result<()> {
        self.events
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(event.clone());
        Ok(())
    }
}
