use crate::core::TimeRange;
use crate::error::{Error, Result};

/// Sliding window cluster finder with range extension.
///
/// A window of width `window` slides over the sorted `times`; every stretch
/// holding more than `multiplicity` times becomes a range
/// `[first + left_extension, last + right_extension]`. `left_extension` can
/// only widen the range downwards (e.g. by a drift length), so it must be
/// `<= 0`.
///
/// A new cluster is folded into the previous range when that range's upper
/// edge plus `window` still reaches past the first time of the cluster, or
/// when the extended cluster would start inside the previous range. The
/// cluster still open when the times run out is merged by the same rule.
pub fn sliding_window(
    times: &[i64],
    window: i64,
    multiplicity: usize,
    left_extension: i64,
    right_extension: i64,
) -> Result<Vec<TimeRange>> {
    if left_extension > 0 {
        return Err(Error::PositiveLeftExtension(left_extension));
    }
    if window < 0 {
        return Err(Error::InvalidConfig(format!(
            "window must be >= 0, got {}",
            window
        )));
    }

    let mut ranges = Vec::new();
    if times.is_empty() {
        return Ok(ranges);
    }

    let mut i = 0;
    let mut j = 0;
    while j < times.len() {
        if times[j] - times[i] > window {
            if j - i > multiplicity {
                emit(
                    &mut ranges,
                    window,
                    times[i],
                    times[i] + left_extension,
                    times[j - 1] + right_extension,
                )?;
            }
            i += 1;
        } else {
            j += 1;
        }
    }

    if j - i > multiplicity {
        emit(
            &mut ranges,
            window,
            times[i],
            times[i] + left_extension,
            times[j - 1] + right_extension,
        )?;
    }

    Ok(ranges)
}

fn emit(
    ranges: &mut Vec<TimeRange>,
    window: i64,
    first_time: i64,
    start: i64,
    stop: i64,
) -> Result<()> {
    if let Some(previous) = ranges.last_mut() {
        if previous.stop() + window > first_time || start <= previous.stop() {
            previous.extend_to(stop);
            return Ok(());
        }
    }
    ranges.push(TimeRange::new(start, stop)?);
    Ok(())
}
