use anyhow::{Context, Result};
use log::{debug, error};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;

use crate::core::{Event, EventProcessor};
use crate::dispatch::{Block, BlockSink, BlockSource};
use crate::error::Error;
use crate::observability::StageMetrics;

/// Pulls event blocks, runs every processor over each event and forwards
/// the block under its original sequence number.
///
/// A claimed block is always processed to the end before the next pull.
/// The abort flag is checked between blocks and raised when this worker fails.
pub struct Worker<I, O> {
    id: usize,
    input: I,
    output: O,
    processors: Vec<Arc<dyn EventProcessor>>,
    metrics: Arc<StageMetrics>,
    abort: Arc<AtomicBool>,
}

impl<I, O> Worker<I, O>
where
    I: BlockSource<Block<Event>>,
    O: BlockSink<Block<Event>>,
{
    pub fn new(
        id: usize,
        input: I,
        output: O,
        processors: Vec<Arc<dyn EventProcessor>>,
        metrics: Arc<StageMetrics>,
    ) -> Self {
        Self {
            id,
            input,
            output,
            processors,
            metrics,
            abort: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Share an abort flag with the other stages of a pipeline
    pub fn with_abort(mut self, abort: Arc<AtomicBool>) -> Self {
        self.abort = abort;
        self
    }

    /// Process blocks until a sentinel is pulled; returns its sequence number.
    ///
    /// Blocks the calling thread; `handle` drives the processors' futures.
    pub fn run(self, handle: &Handle) -> Result<u64> {
        let result = self.process_blocks(handle);
        if result.is_err() {
            self.abort.store(true, Ordering::SeqCst);
        }
        result
    }

    fn process_blocks(&self, handle: &Handle) -> Result<u64> {
        loop {
            if self.abort.load(Ordering::SeqCst) {
                debug!("Worker {} aborting", self.id);
                return Err(Error::Cancelled.into());
            }

            let (sequence, events) = match self.input.pull()? {
                Block::Sentinel { sequence } => {
                    debug!("Worker {} stopping at sentinel {}", self.id, sequence);
                    return Ok(sequence);
                }
                Block::Data { sequence, items } => (sequence, items),
            };

            let start = self.metrics.start();
            let mut processed = Vec::with_capacity(events.len());
            for event in events {
                match handle.block_on(self.process_event(event)) {
                    Ok(event) => processed.push(event),
                    Err(e) => {
                        self.metrics.record_error();
                        error!("Worker {} failed on block {}: {:#}", self.id, sequence, e);
                        return Err(e.context(format!("worker {} block {}", self.id, sequence)));
                    }
                }
            }

            self.metrics.record_events(processed.len() as u64);
            self.metrics.record_block();
            self.metrics.finish(start);
            debug!(
                "Worker {} finished block {} ({} events)",
                self.id,
                sequence,
                processed.len()
            );
            self.output.push(Block::Data {
                sequence,
                items: processed,
            })?;
        }
    }

    async fn process_event(&self, mut event: Event) -> Result<Event> {
        let number = event.event_number;
        for processor in &self.processors {
            event = processor
                .process(event)
                .await
                .with_context(|| format!("{} failed on event {}", processor.name(), number))?;
        }
        Ok(event)
    }
}
