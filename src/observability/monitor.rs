use super::MetricsCollector;

pub struct PipelineMonitor {
    collector: MetricsCollector,
}

impl PipelineMonitor {
    pub fn new(collector: MetricsCollector) -> Self {
        Self { collector }
    }

    pub fn generate_report(&self) -> String {
        let snapshot = self.collector.snapshot();
        if snapshot.is_empty() {
            return "No stages registered".to_string();
        }

        let mut report = String::from("=== Reconstruction Metrics ===\n");
        for stage in &snapshot {
            report.push_str(&format!(
                "\n[{}]\n  Blocks: {}\n  Events: {}\n  Errors: {}\n  Avg Latency: {}μs\n",
                stage.stage, stage.blocks, stage.events, stage.errors, stage.avg_latency_us
            ));
        }
        report
    }

    pub fn collector(&self) -> &MetricsCollector {
        &self.collector
    }
}
