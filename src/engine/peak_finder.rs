use anyhow::Result;
use async_trait::async_trait;

use super::PeakFindingConfig;
use crate::core::{Event, EventProcessor, Peak};
use crate::dsp::{find_peak_in_signal, intervals_above_threshold, peaks_and_valleys, AcceptanceTest};

/// Keeps two peaks apart when the peak stands at least `min_ratio` times
/// above the valley, or the valley reaches down to zero.
#[derive(Debug, Clone, Copy)]
pub struct ValleyRatio {
    pub min_ratio: f64,
}

impl AcceptanceTest for ValleyRatio {
    fn accept(&self, signal: &[f64], peak: usize, valley: usize) -> bool {
        let valley_height = signal[valley];
        valley_height <= 0.0 || signal[peak] / valley_height >= self.min_ratio
    }
}

/// Splits an event's summed waveform into peaks.
///
/// Intervals above threshold are found on the filtered waveform and split at
/// the valleys that survive refinement of the whole waveform. Each piece
/// yields one peak, with height and area taken from the unfiltered waveform.
pub struct PeakFinder {
    config: PeakFindingConfig,
    test: Box<dyn AcceptanceTest + Send + Sync>,
}

impl PeakFinder {
    pub fn new(config: PeakFindingConfig) -> Self {
        let test = ValleyRatio {
            min_ratio: config.min_valley_ratio,
        };
        Self::with_test(config, test)
    }

    pub fn with_test<T>(config: PeakFindingConfig, test: T) -> Self
    where
        T: AcceptanceTest + Send + Sync + 'static,
    {
        Self {
            config,
            test: Box::new(test),
        }
    }

    pub fn find_peaks(&self, waveform: &[f64]) -> crate::Result<Vec<Peak>> {
        let filtered = moving_average(waveform, self.config.filter_width);
        let fraction = self.config.integration_bound_fraction;
        let split = peaks_and_valleys(&filtered, self.test.as_ref())?;
        // The last valley trails the last peak and separates nothing
        let separating = &split.valleys[..split.peaks.len().saturating_sub(1)];
        let mut peaks = Vec::new();

        for (left, right) in intervals_above_threshold(&filtered, self.config.threshold) {
            let mut start = left;
            for &end in separating.iter().filter(|&&v| left <= v && v < right) {
                peaks.push(find_peak_in_signal(
                    &filtered[start..=end],
                    &waveform[start..=end],
                    fraction,
                    start,
                )?);
                start = end + 1;
            }
            peaks.push(find_peak_in_signal(
                &filtered[start..=right],
                &waveform[start..=right],
                fraction,
                start,
            )?);
        }
        Ok(peaks)
    }
}

#[async_trait]
impl EventProcessor for PeakFinder {
    fn name(&self) -> &str {
        "peak_finder"
    }

    async fn process(&self, mut event: Event) -> Result<Event> {
        let waveform = event.summed_waveform();
        event.peaks = self.find_peaks(&waveform)?;
        Ok(event)
    }
}

/// Centered moving average, shrinking the window at the edges
fn moving_average(signal: &[f64], width: usize) -> Vec<f64> {
    if width <= 1 {
        return signal.to_vec();
    }
    let before = width / 2;
    let after = (width - 1) / 2;
    (0..signal.len())
        .map(|i| {
            let lo = i.saturating_sub(before);
            let hi = (i + after).min(signal.len() - 1);
            let window = &signal[lo..=hi];
            window.iter().sum::<f64>() / window.len() as f64
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moving_average_identity_and_edges() {
        let signal = [0.0, 3.0, 6.0, 3.0];
        assert_eq!(moving_average(&signal, 1), signal.to_vec());
        assert_eq!(moving_average(&signal, 3), vec![1.5, 3.0, 4.0, 4.5]);
    }

    fn triangle(len: usize, center: usize, height: f64, slope: f64) -> Vec<f64> {
        (0..len)
            .map(|i| (height - slope * (i as f64 - center as f64).abs()).max(0.0))
            .collect()
    }

    fn double_peak() -> Vec<f64> {
        triangle(45, 15, 20.0, 2.0)
            .iter()
            .zip(triangle(45, 28, 20.0, 4.0))
            .map(|(a, b)| a + b)
            .collect()
    }

    fn config(min_valley_ratio: f64) -> PeakFindingConfig {
        PeakFindingConfig {
            threshold: 1.0,
            min_valley_ratio,
            ..Default::default()
        }
    }

    #[test]
    fn test_deep_valley_splits_interval() {
        let peaks = PeakFinder::new(config(2.0)).find_peaks(&double_peak()).unwrap();
        assert_eq!(peaks.len(), 2);

        assert_eq!(peaks[0].index_of_maximum(), 15);
        assert_eq!((peaks[0].left(), peaks[0].right()), (6, 22));
        assert_eq!(peaks[0].area(), 194.0);

        assert_eq!(peaks[1].index_of_maximum(), 28);
        assert_eq!((peaks[1].left(), peaks[1].right()), (23, 32));
        assert_eq!(peaks[1].area(), 106.0);
    }

    #[test]
    fn test_shallow_valley_keeps_one_peak() {
        let peaks = PeakFinder::new(config(10.0)).find_peaks(&double_peak()).unwrap();
        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0].index_of_maximum(), 15);
        assert_eq!((peaks[0].left(), peaks[0].right()), (6, 32));
        assert_eq!(peaks[0].height(), 20.0);
        assert_eq!(peaks[0].area(), 300.0);
    }

    #[test]
    fn test_separate_intervals() {
        let waveform: Vec<f64> = triangle(60, 15, 20.0, 2.0)
            .iter()
            .zip(triangle(60, 40, 20.0, 2.0))
            .map(|(a, b)| a + b)
            .collect();
        let peaks = PeakFinder::new(config(2.0)).find_peaks(&waveform).unwrap();
        let summary: Vec<_> = peaks
            .iter()
            .map(|p| (p.index_of_maximum(), p.left(), p.right(), p.area()))
            .collect();
        assert_eq!(summary, vec![(15, 6, 24, 200.0), (40, 31, 49, 200.0)]);
    }

    #[test]
    fn test_flat_waveform_has_no_peaks() {
        let peaks = PeakFinder::new(config(2.0)).find_peaks(&[0.0; 20]).unwrap();
        assert!(peaks.is_empty());
    }

    #[test]
    fn test_valley_ratio() {
        let test = ValleyRatio { min_ratio: 2.0 };
        let signal = [10.0, 4.0, 6.0, 0.0];
        assert!(test.accept(&signal, 0, 1));
        assert!(!test.accept(&signal, 2, 1));
        assert!(test.accept(&signal, 2, 3));
    }
}
