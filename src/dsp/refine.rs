//! Derivative-based peak/valley candidates and their iterative refinement.

use super::sign::{sign_changes, BoundaryPolicy};
use crate::error::{Error, Result};

/// Antisymmetric 9-tap smoothing derivative filter
pub const DERIVATIVE_KERNEL: [f64; 9] = [
    -0.003059, -0.035187, -0.118739, -0.143928, 0.000000, 0.143928, 0.118739, 0.035187, 0.003059,
];

/// Judges whether a peak and an adjacent valley are genuinely separated
pub trait AcceptanceTest {
    fn accept(&self, signal: &[f64], peak: usize, valley: usize) -> bool;
}

impl<F> AcceptanceTest for F
where
    F: Fn(&[f64], usize, usize) -> bool,
{
    fn accept(&self, signal: &[f64], peak: usize, valley: usize) -> bool {
        self(signal, peak, valley)
    }
}

/// Surviving peaks and the valleys that separate them.
///
/// Both lists are ascending and of equal length; `valleys[k]` lies strictly
/// between `peaks[k]` and `peaks[k + 1]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeaksAndValleys {
    pub peaks: Vec<usize>,
    pub valleys: Vec<usize>,
}

/// Negated smoothed derivative, same length as `signal`.
///
/// The kernel is applied as a convolution, which flips it; positive output
/// means the signal is falling. The `(len - 1) / 2` samples at each edge are
/// zeroed since the kernel runs off the signal there.
pub fn smoothed_slope(signal: &[f64]) -> Vec<f64> {
    let n = signal.len();
    let half = (DERIVATIVE_KERNEL.len() - 1) / 2;
    let mut slope = vec![0.0; n];
    if n < DERIVATIVE_KERNEL.len() {
        return slope;
    }

    for (i, out) in slope.iter_mut().enumerate().take(n - half).skip(half) {
        *out = DERIVATIVE_KERNEL
            .iter()
            .enumerate()
            .map(|(m, k)| k * signal[i + half - m])
            .sum();
    }
    slope
}

/// Find peaks and valleys from derivative sign changes, then merge
/// candidates that `test` does not consider separated.
///
/// For each peak the nearest valley on either side is tested. When a test
/// fails a valley is removed together with one of its two neighbouring
/// peaks, and the previous peak is re-examined. If both sides fail, the
/// shallower valley (higher signal) goes; on a tie, the right one. Of the
/// two peaks around the removed valley the lower goes; on a tie, the right
/// one. A valley past the last peak takes the peak to its left with it.
pub fn peaks_and_valleys<T>(signal: &[f64], test: &T) -> Result<PeaksAndValleys>
where
    T: AcceptanceTest + ?Sized,
{
    if signal.len() < DERIVATIVE_KERNEL.len() {
        return Ok(PeaksAndValleys::default());
    }

    let slope = smoothed_slope(signal);
    let (mut peaks, mut valleys) = sign_changes(&slope, BoundaryPolicy::Never);
    if peaks.len() != valleys.len() {
        return Err(Error::Inconsistent(format!(
            "{} peak candidates but {} valley candidates",
            peaks.len(),
            valleys.len()
        )));
    }

    // Single-sample slope runs give a peak and valley at the same index
    let (kept_peaks, kept_valleys): (Vec<usize>, Vec<usize>) = peaks
        .iter()
        .zip(&valleys)
        .filter(|(p, v)| p != v)
        .map(|(p, v)| (*p, *v))
        .unzip();
    peaks = kept_peaks;
    valleys = kept_valleys;

    if let Some((p, v)) = peaks.iter().zip(&valleys).find(|(p, v)| v <= p) {
        return Err(Error::Inconsistent(format!(
            "valley {} does not follow its peak {}",
            v, p
        )));
    }

    if peaks.len() < 2 {
        return Ok(PeaksAndValleys { peaks, valleys });
    }

    let mut cursor = 0;
    while cursor < peaks.len() {
        let peak = peaks[cursor];

        let split = valleys.partition_point(|&v| v < peak);
        let valley_left = split.checked_sub(1).map(|i| valleys[i]);
        let valley_right = *valleys.get(split).ok_or_else(|| {
            Error::Inconsistent(format!("peak {} has no valley to its right", peak))
        })?;

        let fail_left = valley_left.map_or(false, |v| !test.accept(signal, peak, v));
        let fail_right = !test.accept(signal, peak, valley_right);
        if !fail_left && !fail_right {
            cursor += 1;
            continue;
        }

        let doomed_valley = match valley_left {
            Some(left) if fail_left && fail_right => {
                if signal[left] > signal[valley_right] {
                    left
                } else {
                    valley_right
                }
            }
            Some(left) if fail_left => left,
            _ => valley_right,
        };

        let right_peak_pos = peaks.partition_point(|&p| p < doomed_valley);
        let left_peak_pos = right_peak_pos.checked_sub(1).ok_or_else(|| {
            Error::Inconsistent(format!("valley {} precedes every peak", doomed_valley))
        })?;
        let doomed_peak_pos = if right_peak_pos >= peaks.len() {
            left_peak_pos
        } else if signal[peaks[left_peak_pos]] < signal[peaks[right_peak_pos]] {
            left_peak_pos
        } else {
            right_peak_pos
        };

        peaks.remove(doomed_peak_pos);
        valleys.retain(|&v| v != doomed_valley);
        cursor = cursor.saturating_sub(1);
    }

    debug_assert_eq!(peaks.len(), valleys.len());
    Ok(PeaksAndValleys { peaks, valleys })
}
