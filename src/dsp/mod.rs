//! Waveform analysis: sign changes, peak extents and peak/valley refinement.

pub mod bounds;
pub mod refine;
pub mod sign;

pub use bounds::{find_peak_in_signal, peak_bounds, width_at_fraction};
pub use refine::{peaks_and_valleys, smoothed_slope, AcceptanceTest, PeaksAndValleys, DERIVATIVE_KERNEL};
pub use sign::{intervals_above_threshold, sign_changes, BoundaryPolicy};
