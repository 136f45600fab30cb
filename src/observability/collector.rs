use std::collections::BTreeMap;
use std::sync::Arc;
use super::StageMetrics;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSnapshot {
    pub stage: String,
    pub blocks: u64,
    pub events: u64,
    pub errors: u64,
    pub avg_latency_us: u64,
}

/// Registry of stage metrics, ordered by stage name
#[derive(Clone, Default)]
pub struct MetricsCollector {
    stages: BTreeMap<String, Arc<StageMetrics>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and register metrics for `stage`
    pub fn register(&mut self, stage: impl Into<String>) -> Arc<StageMetrics> {
        let stage = stage.into();
        let metrics = Arc::new(StageMetrics::new(stage.clone()));
        self.stages.insert(stage, metrics.clone());
        metrics
    }

    pub fn get(&self, stage: &str) -> Option<Arc<StageMetrics>> {
        self.stages.get(stage).cloned()
    }

    pub fn snapshot(&self) -> Vec<StageSnapshot> {
        self.stages
            .values()
            .map(|m| StageSnapshot {
                stage: m.stage().to_string(),
                blocks: m.blocks(),
                events: m.events(),
                errors: m.errors(),
                avg_latency_us: m.avg_latency_us(),
            })
            .collect()
    }

    /// Sum of `events` over every stage whose name starts with `prefix`
    pub fn total_events(&self, prefix: &str) -> u64 {
        self.stages
            .iter()
            .filter(|(name, _)| name.starts_with(prefix))
            .map(|(_, m)| m.events())
            .sum()
    }
}
