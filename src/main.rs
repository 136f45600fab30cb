use anyhow::Result;
use std::sync::Arc;

use daqrecon::core::RawPulse;
use daqrecon::engine::{PipelineConfig, ReconstructionPipeline};
use daqrecon::io::{EventSink, JsonLinesSink, MemoryPulseSource};

/// Synthetic acquisition: bursts of pulses every 50 µs, each burst made of
/// a few channels seeing one or two overlapping signals
fn synthetic_pulses(n_bursts: usize, sample_duration: i64) -> Vec<RawPulse> {
    let mut pulses = Vec::new();
    for burst in 0..n_bursts {
        let t0 = 1_000 + burst as i64 * 50_000;
        let double = burst % 3 == 0;
        for channel in 0..4u16 {
            let height = 40 + 10 * channel as i16;
            let mut samples: Vec<i16> = (0..30)
                .map(|i| height - (i as i16 - 10).abs() * height / 10)
                .map(|v| v.max(0))
                .collect();
            if double {
                for (i, s) in samples.iter_mut().enumerate().skip(16) {
                    *s += (height - (i as i16 - 22).abs() * height / 6).max(0);
                }
            }
            pulses.push(RawPulse::from_samples(
                channel,
                t0 + channel as i64 * sample_duration,
                &samples,
            ));
        }
    }
    pulses
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("Event Reconstruction Demo");
    println!("=========================\n");

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::from_json(serde_json::json!({
            "n_workers": 4,
            "block_size": 5,
            "clustering": {"window": 200, "multiplicity": 2, "left_extension": -50, "right_extension": 400},
            "peak_finding": {"threshold": 20.0, "min_valley_ratio": 1.5}
        }))?,
    };
    let output = args.next().unwrap_or_else(|| "events.jsonl".to_string());

    let source = Arc::new(MemoryPulseSource::finished(synthetic_pulses(
        40,
        config.sample_duration_ns,
    )));
    println!("Generated {} pulses", source.len());

    let sink = Arc::new(JsonLinesSink::create(&output)?);
    let pipeline = ReconstructionPipeline::new(
        config,
        source,
        sink.clone() as Arc<dyn EventSink>,
    )?;

    let summary = pipeline.run().await?;
    sink.flush()?;

    println!(
        "\nBuilt {} events, wrote {} to {} ({} blocks, at most {} held out of order)",
        summary.events_built, summary.events_written, output, summary.blocks, summary.max_pending
    );
    println!("\n{}", summary.report);

    Ok(())
}
