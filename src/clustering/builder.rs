use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;

use super::sliding_window;
use crate::core::Event;
use crate::dispatch::{Block, BlockProducer, BlockSink};
use crate::engine::ClusteringConfig;
use crate::error::Error;
use crate::io::PulseSource;
use crate::observability::StageMetrics;
use crate::resilience::RetryPolicy;

/// Turns the pulse stream of a running acquisition into event shells.
///
/// Each poll fetches the pulse times after the last one seen, clusters them
/// and pushes one shell per range. Polls that find nothing wait according to
/// the retry policy. The builder stops after the first poll that began once
/// the acquisition had already ended, or before the next poll once the abort
/// flag is raised.
pub struct EventBuilder {
    source: Arc<dyn PulseSource>,
    clustering: ClusteringConfig,
    retry: RetryPolicy,
    sample_duration: i64,
    metrics: Arc<StageMetrics>,
    abort: Arc<AtomicBool>,
}

impl EventBuilder {
    pub fn new(
        source: Arc<dyn PulseSource>,
        clustering: ClusteringConfig,
        retry: RetryPolicy,
        sample_duration: i64,
    ) -> Self {
        Self {
            source,
            clustering,
            retry,
            sample_duration,
            metrics: Arc::new(StageMetrics::new("builder")),
            abort: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<StageMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Stop polling once `abort` is raised by a downstream stage
    pub fn with_abort(mut self, abort: Arc<AtomicBool>) -> Self {
        self.abort = abort;
        self
    }

    /// Run to completion, then shut the producer down. Returns the sentinel's
    /// sequence number.
    ///
    /// Blocks the calling thread; `handle` drives the source's futures.
    pub fn run<S>(&self, handle: &Handle, mut producer: BlockProducer<Event, S>) -> Result<u64>
    where
        S: BlockSink<Block<Event>>,
    {
        info!(
            "Building events with window {} ns, multiplicity {}, extensions [{}, {}] ns",
            self.clustering.window,
            self.clustering.multiplicity,
            self.clustering.left_extension,
            self.clustering.right_extension
        );

        let mut last_time: Option<i64> = None;
        let mut next_event_number = 0u64;
        let mut idle_polls = 0usize;
        let mut failures = 0usize;

        loop {
            if self.abort.load(Ordering::SeqCst) {
                warn!("Event building aborted after {} events", next_event_number);
                return Err(Error::Cancelled.into());
            }

            // Read the flag before querying, so pulses written just before the
            // acquisition ends are still picked up by this poll
            let ended = match handle.block_on(self.source.acquisition_ended()) {
                Ok(ended) => ended,
                Err(e) => {
                    self.backoff(&mut failures, e)?;
                    continue;
                }
            };

            debug!("Searching for pulses after {:?} ns", last_time);
            let times = match handle.block_on(self.source.pulse_times_after(last_time)) {
                Ok(times) => times,
                Err(e) => {
                    self.backoff(&mut failures, e)?;
                    continue;
                }
            };
            failures = 0;

            let (first, last) = match (times.first(), times.last()) {
                (Some(&first), Some(&last)) => (first, last),
                _ => {
                    if ended {
                        break;
                    }
                    idle_polls += 1;
                    let delay = self.retry.delay(idle_polls);
                    debug!("No new pulses, waiting {:?}", delay);
                    std::thread::sleep(delay);
                    continue;
                }
            };
            idle_polls = 0;
            last_time = Some(last);

            let start = self.metrics.start();
            info!("Processing range [{}, {}] ns", first, last);
            let ranges = sliding_window(
                &times,
                self.clustering.window,
                self.clustering.multiplicity,
                self.clustering.left_extension,
                self.clustering.right_extension,
            )
            .context("clustering pulse times")?;
            info!("Found {} events", ranges.len());

            self.metrics.record_events(ranges.len() as u64);
            for range in ranges {
                producer.push(Event::shell(next_event_number, range, self.sample_duration))?;
                next_event_number += 1;
            }
            self.metrics.record_block();
            self.metrics.finish(start);

            if ended {
                break;
            }
        }

        info!("Acquisition ended after {} events", next_event_number);
        Ok(producer.shutdown()?)
    }

    fn backoff(&self, failures: &mut usize, error: anyhow::Error) -> Result<()> {
        *failures += 1;
        self.metrics.record_error();
        if self.retry.exhausted(*failures) {
            return Err(error.context(format!("pulse source failed {} times in a row", failures)));
        }
        let delay = self.retry.delay(*failures);
        warn!("Pulse source error ({}), retrying in {:?}", error, delay);
        std::thread::sleep(delay);
        Ok(())
    }
}
