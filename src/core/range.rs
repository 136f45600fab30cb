use serde::{Deserialize, Serialize};
use crate::error::{Error, Result};

/// Closed time interval `[start, stop]` in ns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    start: i64,
    stop: i64,
}

impl TimeRange {
    pub fn new(start: i64, stop: i64) -> Result<Self> {
        if start > stop {
            return Err(Error::InvalidRange { start, stop });
        }
        Ok(Self { start, stop })
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn stop(&self) -> i64 {
        self.stop
    }

    pub fn duration(&self) -> i64 {
        self.stop - self.start
    }

    pub fn contains(&self, time: i64) -> bool {
        self.start <= time && time <= self.stop
    }

    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start <= other.stop && other.start <= self.stop
    }

    /// Move the upper edge to `stop`, never shrinking the range
    pub(crate) fn extend_to(&mut self, stop: i64) {
        self.stop = self.stop.max(stop);
    }
}
