pub mod config;
pub mod filler;
pub mod peak_finder;
pub mod pipeline;
pub mod worker;

pub use config::{ClusteringConfig, PeakFindingConfig, PipelineConfig};
pub use filler::PulseFiller;
pub use peak_finder::{PeakFinder, ValleyRatio};
pub use pipeline::{PipelineSummary, ReconstructionPipeline};
pub use worker::Worker;
