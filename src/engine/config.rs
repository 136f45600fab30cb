use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::resilience::RetryPolicy;

/// Sliding-window event building parameters, all times in ns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    pub window: i64,
    pub multiplicity: usize,
    pub left_extension: i64,
    pub right_extension: i64,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            window: 1000,
            multiplicity: 3,
            left_extension: -10,
            right_extension: 7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeakFindingConfig {
    /// Summed-waveform level a candidate interval must exceed
    pub threshold: f64,

    /// Fraction of the maximum at which a peak's extent ends
    pub integration_bound_fraction: f64,

    /// Minimum peak/valley height ratio for two peaks to stay separate
    pub min_valley_ratio: f64,

    /// Moving-average width of the filtering signal; 1 disables filtering
    pub filter_width: usize,
}

impl Default for PeakFindingConfig {
    fn default() -> Self {
        Self {
            threshold: 10.0,
            integration_bound_fraction: 0.1,
            min_valley_ratio: 2.0,
            filter_width: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub n_workers: usize,

    /// Events per dispatched block
    pub block_size: usize,

    /// Blocks each queue holds before pushers wait
    pub queue_capacity: usize,

    /// Digitizer sample width in ns
    pub sample_duration_ns: i64,

    pub clustering: ClusteringConfig,
    pub retry: RetryPolicy,
    pub peak_finding: PeakFindingConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            n_workers: 2,
            block_size: 10,
            queue_capacity: 16,
            sample_duration_ns: 10,
            clustering: ClusteringConfig::default(),
            retry: RetryPolicy::default(),
            peak_finding: PeakFindingConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Build from JSON; missing fields take their defaults
    pub fn from_json(config: Value) -> Result<Self> {
        let config: Self = serde_json::from_value(config).context("parsing pipeline config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let value: Value = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Self::from_json(value)
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_workers == 0 {
            return Err(anyhow!("n_workers must be at least 1"));
        }
        if self.block_size == 0 {
            return Err(anyhow!("block_size must be at least 1"));
        }
        if self.queue_capacity == 0 {
            return Err(anyhow!("queue_capacity must be at least 1"));
        }
        if self.sample_duration_ns <= 0 {
            return Err(anyhow!(
                "sample_duration_ns must be positive, got {}",
                self.sample_duration_ns
            ));
        }
        if self.clustering.left_extension > 0 {
            return Err(anyhow!(
                "clustering.left_extension must be <= 0, got {}",
                self.clustering.left_extension
            ));
        }
        if self.clustering.window < 0 {
            return Err(anyhow!("clustering.window must be >= 0"));
        }
        let fraction = self.peak_finding.integration_bound_fraction;
        if !(0.0..=1.0).contains(&fraction) {
            return Err(anyhow!(
                "peak_finding.integration_bound_fraction must be in [0, 1], got {}",
                fraction
            ));
        }
        if self.peak_finding.filter_width == 0 {
            return Err(anyhow!("peak_finding.filter_width must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let config = PipelineConfig::from_json(serde_json::json!({})).unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.block_size, 10);
        assert_eq!(config.clustering.multiplicity, 3);
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let config = PipelineConfig::from_json(serde_json::json!({
            "n_workers": 4,
            "clustering": {"window": 500},
            "peak_finding": {"threshold": 3.5}
        }))
        .unwrap();
        assert_eq!(config.n_workers, 4);
        assert_eq!(config.clustering.window, 500);
        assert_eq!(config.clustering.left_extension, -10);
        assert_eq!(config.peak_finding.threshold, 3.5);
        assert_eq!(config.peak_finding.filter_width, 1);
    }

    #[test]
    fn test_rejects_positive_left_extension() {
        let result = PipelineConfig::from_json(serde_json::json!({
            "clustering": {"left_extension": 5}
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_zero_workers() {
        let result = PipelineConfig::from_json(serde_json::json!({"n_workers": 0}));
        assert!(result.is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.json");
        std::fs::write(&path, r#"{"block_size": 3, "sample_duration_ns": 4}"#).unwrap();

        let config = PipelineConfig::from_file(&path).unwrap();
        assert_eq!(config.block_size, 3);
        assert_eq!(config.sample_duration_ns, 4);
    }
}
