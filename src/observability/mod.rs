pub mod collector;
pub mod metrics;
pub mod monitor;

pub use collector::{MetricsCollector, StageSnapshot};
pub use metrics::StageMetrics;
pub use monitor::PipelineMonitor;
