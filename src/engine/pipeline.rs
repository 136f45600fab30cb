use anyhow::{anyhow, Context, Result};
use log::{debug, error, info};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use super::{PeakFinder, PipelineConfig, PulseFiller, Worker};
use crate::clustering::EventBuilder;
use crate::core::{Event, EventProcessor};
use crate::dispatch::{memory_queue, Block, BlockProducer, BlockSink, MemorySource, OrderedReceiver};
use crate::io::{EventSink, PulseSource};
use crate::observability::{MetricsCollector, PipelineMonitor, StageMetrics};

/// Outcome of a completed reconstruction run
#[derive(Debug, Clone)]
pub struct PipelineSummary {
    pub events_built: u64,
    pub events_written: u64,

    /// Data blocks dispatched to workers
    pub blocks: u64,

    /// Deepest out-of-order backlog seen by the writer
    pub max_pending: usize,

    pub report: String,
}

/// Event building, parallel per-event reconstruction and ordered writing.
///
/// ```text
/// source -> builder -> [input queue] -> N workers -> [output queue] -> ordered writer -> sink
/// ```
///
/// The sink sees events in the order the builder produced them, whichever
/// worker finishes first.
pub struct ReconstructionPipeline {
    config: PipelineConfig,
    source: Arc<dyn PulseSource>,
    sink: Arc<dyn EventSink>,
    processors: Vec<Arc<dyn EventProcessor>>,
    collector: MetricsCollector,
    builder_metrics: Arc<StageMetrics>,
    worker_metrics: Vec<Arc<StageMetrics>>,
    writer_metrics: Arc<StageMetrics>,
}

impl ReconstructionPipeline {
    /// Pipeline with the default processor chain: pulse filler, then peak finder
    pub fn new(
        config: PipelineConfig,
        source: Arc<dyn PulseSource>,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self> {
        config.validate()?;
        let processors: Vec<Arc<dyn EventProcessor>> = vec![
            Arc::new(PulseFiller::new(source.clone())),
            Arc::new(PeakFinder::new(config.peak_finding.clone())),
        ];

        let mut collector = MetricsCollector::new();
        let builder_metrics = collector.register("builder");
        let worker_metrics = (0..config.n_workers)
            .map(|id| collector.register(format!("worker-{}", id)))
            .collect();
        let writer_metrics = collector.register("writer");

        Ok(Self {
            config,
            source,
            sink,
            processors,
            collector,
            builder_metrics,
            worker_metrics,
            writer_metrics,
        })
    }

    pub fn from_json(
        config: Value,
        source: Arc<dyn PulseSource>,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self> {
        Self::new(PipelineConfig::from_json(config)?, source, sink)
    }

    /// Replace the per-event processor chain
    pub fn with_processors(mut self, processors: Vec<Arc<dyn EventProcessor>>) -> Self {
        self.processors = processors;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Live view of the stage metrics, usable while `run` is in progress
    pub fn get_monitor(&self) -> PipelineMonitor {
        PipelineMonitor::new(self.collector.clone())
    }

    pub async fn run(self) -> Result<PipelineSummary> {
        let handle = Handle::current();
        let n_workers = self.config.n_workers;
        info!(
            "Starting reconstruction: {} workers, blocks of {} events",
            n_workers, self.config.block_size
        );

        let (input_tx, input_rx) = memory_queue::<Block<Event>>(self.config.queue_capacity);
        let (output_tx, output_rx) = memory_queue::<Block<Event>>(self.config.queue_capacity);
        let abort = Arc::new(AtomicBool::new(false));

        let writer_metrics = self.writer_metrics.clone();
        let sink = self.sink.clone();
        let writer_handle = handle.clone();
        let writer_abort = abort.clone();
        let writer: JoinHandle<Result<(u64, usize)>> = tokio::task::spawn_blocking(move || {
            let mut ordered = OrderedReceiver::new(output_rx);
            let result = write_in_order(&mut ordered, &*sink, &writer_metrics, &writer_handle);
            if result.is_err() {
                writer_abort.store(true, Ordering::SeqCst);
            }
            result.map(|written| (written, ordered.max_pending()))
        });

        let mut workers = Vec::with_capacity(n_workers);
        for (id, metrics) in self.worker_metrics.iter().enumerate() {
            let worker = Worker::new(
                id,
                input_rx.clone(),
                output_tx.clone(),
                self.processors.clone(),
                metrics.clone(),
            )
            .with_abort(abort.clone());
            let worker_handle = handle.clone();
            workers.push(tokio::task::spawn_blocking(move || worker.run(&worker_handle)));
        }
        drop(input_rx);

        let builder = EventBuilder::new(
            self.source.clone(),
            self.config.clustering.clone(),
            self.config.retry.clone(),
            self.config.sample_duration_ns,
        )
        .with_metrics(self.builder_metrics.clone())
        .with_abort(abort.clone());
        let producer = BlockProducer::new(input_tx.clone(), self.config.block_size)?;
        let builder_handle = handle.clone();
        let built = tokio::task::spawn_blocking(move || builder.run(&builder_handle, producer))
            .await
            .map_err(|e| anyhow!("builder task failed: {}", e))
            .and_then(|result| result);

        let mut errors = Vec::new();
        let sentinel = match built {
            Ok(sentinel) => {
                // One sentinel per worker so each of them stops exactly once
                for _ in 1..n_workers {
                    if input_tx.push(Block::Sentinel { sequence: sentinel }).is_err() {
                        // Every worker is gone already; their results say why
                        break;
                    }
                }
                Some(sentinel)
            }
            Err(e) => {
                error!("Event building stopped: {:#}", e);
                abort.store(true, Ordering::SeqCst);
                errors.push(e);
                None
            }
        };
        drop(input_tx);

        for (id, worker) in workers.into_iter().enumerate() {
            let result = worker
                .await
                .map_err(|e| anyhow!("worker task failed: {}", e))
                .and_then(|result| result);
            if let Err(e) = result {
                error!("Worker {} stopped: {:#}", id, e);
                errors.push(e);
            }
        }

        if let Some(e) = root_cause(errors) {
            drop(output_tx);
            return Err(prefer_writer_error(writer, e).await);
        }
        let sentinel = sentinel.ok_or_else(|| anyhow!("event building ended without a sentinel"))?;

        output_tx.push(Block::Sentinel { sequence: sentinel })?;
        drop(output_tx);
        let (events_written, max_pending) = writer
            .await
            .map_err(|e| anyhow!("writer task failed: {}", e))?
            .context("writing events")?;

        let events_built = self.builder_metrics.events();
        info!(
            "Reconstruction finished: {} events built, {} written",
            events_built, events_written
        );

        Ok(PipelineSummary {
            events_built,
            events_written,
            blocks: sentinel,
            max_pending,
            report: PipelineMonitor::new(self.collector).generate_report(),
        })
    }
}

fn write_in_order(
    ordered: &mut OrderedReceiver<Event, MemorySource<Block<Event>>>,
    sink: &dyn EventSink,
    metrics: &StageMetrics,
    handle: &Handle,
) -> Result<u64> {
    let mut written = 0u64;
    for event in ordered {
        let event = event?;
        let start = metrics.start();
        handle.block_on(sink.write_event(&event))?;
        metrics.record_events(1);
        metrics.finish(start);
        written += 1;
    }
    Ok(written)
}

/// Disconnects and aborts are knock-on effects of a failure elsewhere
fn is_knock_on(error: &anyhow::Error) -> bool {
    matches!(
        error.downcast_ref::<crate::Error>(),
        Some(crate::Error::Disconnected) | Some(crate::Error::Cancelled)
    )
}

/// The first error that is not a knock-on effect, else the first error
fn root_cause(mut errors: Vec<anyhow::Error>) -> Option<anyhow::Error> {
    match errors.iter().position(|e| !is_knock_on(e)) {
        Some(index) => Some(errors.swap_remove(index)),
        None => errors.into_iter().next(),
    }
}

/// A writer that failed on its own starves the stages upstream of it, so its
/// error is the root cause. A writer cut off by a failed upstream stage only
/// reports the disconnect.
async fn prefer_writer_error(
    writer: JoinHandle<Result<(u64, usize)>>,
    error: anyhow::Error,
) -> anyhow::Error {
    match writer.await {
        Ok(Err(writer_error)) if !is_knock_on(&writer_error) => {
            writer_error.context("writing events")
        }
        Ok(Err(writer_error)) => {
            debug!("Writer stopped: {:#}", writer_error);
            error
        }
        Err(join_error) => {
            error!("Writer task failed: {}", join_error);
            error
        }
        Ok(Ok(_)) => error,
    }
}
