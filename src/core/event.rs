use serde::{Deserialize, Serialize};
use crate::core::TimeRange;
use crate::error::{Error, Result};

/// Pulse record as delivered by the storage backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPulse {
    pub channel: u16,

    /// Start of the pulse in ns
    pub time: i64,

    /// Little-endian 16-bit samples
    pub data: Vec<u8>,
}

impl RawPulse {
    pub fn from_samples(channel: u16, time: i64, samples: &[i16]) -> Self {
        Self {
            channel,
            time,
            data: samples.iter().flat_map(|s| s.to_le_bytes()).collect(),
        }
    }

    pub fn samples(&self) -> Result<Vec<i16>> {
        if self.data.len() % 2 != 0 {
            return Err(Error::LengthMismatch {
                expected: self.data.len() + 1,
                actual: self.data.len(),
            });
        }
        Ok(self
            .data
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect())
    }
}

/// One digitizer channel's sample burst inside an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pulse {
    pub channel: u16,

    /// Sample offset of the first sample within the event
    pub left: usize,

    pub raw_data: Vec<i16>,
}

impl Pulse {
    pub fn new(channel: u16, left: usize, raw_data: Vec<i16>) -> Self {
        Self { channel, left, raw_data }
    }

    /// Decode a stored pulse and place it relative to `event_start`
    pub fn from_raw(raw: &RawPulse, event_start: i64, sample_duration: i64) -> Result<Self> {
        if sample_duration <= 0 {
            return Err(Error::InvalidConfig(format!(
                "sample duration must be positive, got {}",
                sample_duration
            )));
        }
        let offset = raw.time - event_start;
        if offset < 0 {
            return Err(Error::PulseBeforeEvent {
                time: raw.time,
                event_start,
            });
        }
        Ok(Self {
            channel: raw.channel,
            left: (offset / sample_duration) as usize,
            raw_data: raw.samples()?,
        })
    }

    /// One past the last sample covered by this pulse
    pub fn right(&self) -> usize {
        self.left + self.raw_data.len()
    }
}

/// A single amplitude excursion, in samples relative to its waveform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    index_of_maximum: usize,
    left: usize,
    right: usize,
    height: f64,
    area: f64,
}

impl Peak {
    pub(crate) fn new(index_of_maximum: usize, left: usize, right: usize, height: f64, area: f64) -> Self {
        debug_assert!(left <= index_of_maximum && index_of_maximum <= right);
        Self {
            index_of_maximum,
            left,
            right,
            height,
            area,
        }
    }

    pub fn index_of_maximum(&self) -> usize {
        self.index_of_maximum
    }

    pub fn left(&self) -> usize {
        self.left
    }

    pub fn right(&self) -> usize {
        self.right
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn area(&self) -> f64 {
        self.area
    }

    pub fn width(&self) -> usize {
        self.right - self.left + 1
    }
}

/// Temporally clustered group of pulses treated as one physical occurrence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Position of this event in builder output order
    pub event_number: u64,

    pub start_time: i64,
    pub stop_time: i64,

    /// Digitizer sample width in ns
    pub sample_duration: i64,

    pub pulses: Vec<Pulse>,
    pub peaks: Vec<Peak>,
}

impl Event {
    /// Time bounds only; pulses are attached later by the filler
    pub fn shell(event_number: u64, range: TimeRange, sample_duration: i64) -> Self {
        Self {
            event_number,
            start_time: range.start(),
            stop_time: range.stop(),
            sample_duration,
            pulses: Vec::new(),
            peaks: Vec::new(),
        }
    }

    pub fn range(&self) -> Result<TimeRange> {
        TimeRange::new(self.start_time, self.stop_time)
    }

    /// Number of samples spanned by the time bounds
    pub fn length(&self) -> usize {
        if self.sample_duration <= 0 || self.stop_time < self.start_time {
            return 0;
        }
        ((self.stop_time - self.start_time) / self.sample_duration) as usize + 1
    }

    /// Sum of all pulses placed at their offsets. Pulses reaching past the
    /// time bounds extend the waveform rather than being cut.
    pub fn summed_waveform(&self) -> Vec<f64> {
        let len = self
            .pulses
            .iter()
            .map(Pulse::right)
            .max()
            .unwrap_or(0)
            .max(self.length());

        let mut waveform = vec![0.0; len];
        for pulse in &self.pulses {
            for (sample, value) in waveform[pulse.left..].iter_mut().zip(&pulse.raw_data) {
                *sample += *value as f64;
            }
        }
        waveform
    }
}
