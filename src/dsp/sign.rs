//! Sign-change and threshold-crossing primitives.

/// How samples outside the signal are treated when looking for sign changes.
///
/// There is no sample before index 0 (or after the last index), so a run of
/// positive samples touching an edge has no natural crossing. The policy
/// supplies the value of that virtual neighbour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryPolicy {
    /// Outside is non-positive: index 0 is reported as becoming positive if
    /// it is positive, and a run reaching the end is closed at the last index.
    Positive,
    /// Outside is positive: index 0 never becomes positive and a run reaching
    /// the end stays open.
    NonPositive,
    /// No crossings against the outside, and index 0 is never reported.
    Never,
}

/// Indices where `signal` changes sign.
///
/// Returns `(becomes_positive, becomes_non_positive)`, both ascending:
/// - `becomes_positive`: first index of each run of samples `> 0`
/// - `becomes_non_positive`: last index of each run of samples `> 0`
///   (the sample after it is `<= 0`)
pub fn sign_changes(signal: &[f64], policy: BoundaryPolicy) -> (Vec<usize>, Vec<usize>) {
    let mut becomes_positive = Vec::new();
    let mut becomes_non_positive = Vec::new();
    if signal.is_empty() {
        return (becomes_positive, becomes_non_positive);
    }

    let outside_positive = match policy {
        BoundaryPolicy::Positive => Some(false),
        BoundaryPolicy::NonPositive => Some(true),
        BoundaryPolicy::Never => None,
    };

    let last = signal.len() - 1;
    let mut previous = outside_positive;
    for (i, &value) in signal.iter().enumerate() {
        let current = value > 0.0;
        if let Some(prev) = previous {
            if current && !prev {
                becomes_positive.push(i);
            } else if !current && prev && i > 0 {
                becomes_non_positive.push(i - 1);
            }
        }
        previous = Some(current);
    }

    if outside_positive == Some(false) && signal[last] > 0.0 {
        becomes_non_positive.push(last);
    }

    if policy == BoundaryPolicy::Never {
        becomes_non_positive.retain(|&i| i != 0);
    }

    (becomes_positive, becomes_non_positive)
}

/// Closed intervals `[start, end]` of samples strictly above `threshold`.
pub fn intervals_above_threshold(signal: &[f64], threshold: f64) -> Vec<(usize, usize)> {
    let shifted: Vec<f64> = signal.iter().map(|v| v - threshold).collect();
    let (rising, falling) = sign_changes(&shifted, BoundaryPolicy::Positive);

    // Each run contributes a start <= end, so the merged sorted list pairs up
    let mut bounds: Vec<usize> = rising.into_iter().chain(falling).collect();
    bounds.sort_unstable();
    bounds
        .chunks_exact(2)
        .map(|pair| (pair[0], pair[1]))
        .collect()
}
