use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How long the ingestion stage waits before polling the backend again, and
/// how many consecutive backend failures it tolerates.
///
/// An empty poll is never a failure; it only waits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum RetryPolicy {
    /// Same delay after every attempt
    Fixed { delay_ms: u64, max_attempts: usize },

    /// Delay doubles with each consecutive attempt, capped at `max_ms`
    Exponential {
        base_ms: u64,
        max_ms: u64,
        max_attempts: usize,
    },
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::Exponential {
            base_ms: 250,
            max_ms: 2000,
            max_attempts: 10,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based)
    pub fn delay(&self, attempt: usize) -> Duration {
        match self {
            RetryPolicy::Fixed { delay_ms, .. } => Duration::from_millis(*delay_ms),
            RetryPolicy::Exponential { base_ms, max_ms, .. } => {
                let exponent = attempt.saturating_sub(1).min(32) as u32;
                let ms = base_ms.saturating_mul(1u64 << exponent).min(*max_ms);
                Duration::from_millis(ms)
            }
        }
    }

    /// Whether `failures` consecutive failures exhaust the policy
    pub fn exhausted(&self, failures: usize) -> bool {
        let max = match self {
            RetryPolicy::Fixed { max_attempts, .. } | RetryPolicy::Exponential { max_attempts, .. } => {
                *max_attempts
            }
        };
        failures >= max
    }
}
