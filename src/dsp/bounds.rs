//! Peak extent and single-peak property extraction.

use crate::core::Peak;
use crate::error::{Error, Result};

/// `(left, right)` extent of the peak at `peak_index`.
///
/// The threshold is `min(zero_level, height * fraction_of_max)`. Scanning
/// outward from the peak, each bound is the last sample still at or above the
/// threshold, or the array edge. A peak that is itself below the threshold
/// gets the degenerate bound `(peak_index, peak_index)`.
pub fn peak_bounds(
    signal: &[f64],
    peak_index: usize,
    fraction_of_max: f64,
    zero_level: f64,
) -> Result<(usize, usize)> {
    if signal.is_empty() {
        return Err(Error::EmptySignal);
    }
    if peak_index >= signal.len() {
        return Err(Error::IndexOutOfRange {
            index: peak_index,
            len: signal.len(),
        });
    }

    let height = signal[peak_index];
    let threshold = zero_level.min(height * fraction_of_max);
    if height < threshold {
        return Ok((peak_index, peak_index));
    }

    let below = |v: &f64| *v < threshold;

    let left = signal[..peak_index]
        .iter()
        .rposition(below)
        .map_or(0, |i| i + 1);
    let right = signal[peak_index..]
        .iter()
        .position(below)
        .map_or(signal.len() - 1, |i| peak_index + i - 1);

    Ok((left, right))
}

/// Width in samples of the peak at `peak_index`, measured at `fraction_of_max`.
pub fn width_at_fraction(signal: &[f64], fraction_of_max: f64, peak_index: usize) -> Result<usize> {
    let (left, right) = peak_bounds(signal, peak_index, fraction_of_max, 0.0)?;
    Ok(right - left + 1)
}

/// Index of the first maximum, ignoring NaN samples.
pub(crate) fn argmax(signal: &[f64]) -> Option<usize> {
    signal
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

/// Locate "the" peak of a candidate interval.
///
/// `signal` decides where the peak is and how far it extends; `unfiltered`
/// provides the height, area and position of the maximum within that extent.
/// Indices are shifted by `offset`, the position of `signal[0]` in the full
/// waveform.
pub fn find_peak_in_signal(
    signal: &[f64],
    unfiltered: &[f64],
    fraction_of_max: f64,
    offset: usize,
) -> Result<Peak> {
    let max_index = argmax(signal).ok_or(Error::EmptySignal)?;
    let (left, right) = peak_bounds(signal, max_index, fraction_of_max, 0.0)?;

    if unfiltered.len() <= right {
        return Err(Error::LengthMismatch {
            expected: signal.len(),
            actual: unfiltered.len(),
        });
    }

    let extent = &unfiltered[left..=right];
    let area: f64 = extent.iter().sum();
    let local_max = argmax(extent).unwrap_or(0);

    Ok(Peak::new(
        offset + left + local_max,
        offset + left,
        offset + right,
        extent[local_max],
        area,
    ))
}
