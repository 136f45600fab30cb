use daqrecon::clustering::sliding_window;
use daqrecon::core::TimeRange;
use daqrecon::Error;

fn bounds(ranges: &[TimeRange]) -> Vec<(i64, i64)> {
    ranges.iter().map(|r| (r.start(), r.stop())).collect()
}

#[test]
fn test_two_clusters() {
    let ranges = sliding_window(&[0, 1, 2, 50, 51, 52, 53], 5, 2, -1, 1).unwrap();
    assert_eq!(bounds(&ranges), vec![(-1, 3), (49, 54)]);
}

#[test]
fn test_multiplicity_is_strict() {
    assert!(sliding_window(&[0, 1, 2], 5, 3, 0, 0).unwrap().is_empty());
    assert_eq!(bounds(&sliding_window(&[0, 1, 2], 5, 2, 0, 0).unwrap()), vec![(0, 2)]);
}

#[test]
fn test_merge_threshold_is_strict() {
    // Previous range ends at 3; 3 + 2 is not past the next cluster's first time 5
    let ranges = sliding_window(&[0, 1, 5, 6, 20], 2, 1, 0, 2).unwrap();
    assert_eq!(bounds(&ranges), vec![(0, 3), (5, 8)]);

    // 3 + 2 > 4, so the second cluster is folded in
    let ranges = sliding_window(&[0, 1, 4, 5, 20], 2, 1, 0, 2).unwrap();
    assert_eq!(bounds(&ranges), vec![(0, 7)]);
}

#[test]
fn test_last_cluster_merges_like_the_others() {
    // The second cluster is only emitted once the times run out
    let ranges = sliding_window(&[0, 1, 4, 5], 2, 1, 0, 2).unwrap();
    assert_eq!(bounds(&ranges), vec![(0, 7)]);

    let ranges = sliding_window(&[0, 1, 5, 6], 2, 1, 0, 2).unwrap();
    assert_eq!(bounds(&ranges), vec![(0, 3), (5, 8)]);
}

#[test]
fn test_left_extension_overlap_merges() {
    let ranges = sliding_window(&[0, 1, 10, 11], 2, 1, -10, 0).unwrap();
    assert_eq!(bounds(&ranges), vec![(-10, 11)]);
}

#[test]
fn test_dense_run_is_one_range() {
    let times: Vec<i64> = (0..=10).collect();
    let ranges = sliding_window(&times, 3, 2, 0, 0).unwrap();
    assert_eq!(bounds(&ranges), vec![(0, 10)]);
}

#[test]
fn test_isolated_pulses_with_zero_multiplicity() {
    let ranges = sliding_window(&[0, 100, 200, 300], 50, 0, 0, 0).unwrap();
    assert_eq!(
        bounds(&ranges),
        vec![(0, 0), (100, 100), (200, 200), (300, 300)]
    );
}

#[test]
fn test_single_pulse_zero_window() {
    assert_eq!(bounds(&sliding_window(&[5], 0, 0, 0, 0).unwrap()), vec![(5, 5)]);
}

#[test]
fn test_coincident_times() {
    let ranges = sliding_window(&[3, 3, 3], 0, 2, -2, 2).unwrap();
    assert_eq!(bounds(&ranges), vec![(1, 5)]);
}

#[test]
fn test_empty_input() {
    assert!(sliding_window(&[], 10, 1, 0, 0).unwrap().is_empty());
}

#[test]
fn test_positive_left_extension_rejected() {
    assert!(matches!(
        sliding_window(&[0, 1, 2], 5, 1, 3, 0),
        Err(Error::PositiveLeftExtension(3))
    ));
}

#[test]
fn test_negative_window_rejected() {
    assert!(matches!(
        sliding_window(&[0, 1, 2], -1, 1, 0, 0),
        Err(Error::InvalidConfig(_))
    ));
}

#[test]
fn test_ranges_are_sorted_and_disjoint() {
    let mut state = 7u64;
    let mut time = 0i64;
    let times: Vec<i64> = (0..500)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            time += ((state >> 33) % 40) as i64;
            time
        })
        .collect();

    for (window, multiplicity, left, right) in [(20, 1, 0, 0), (30, 2, -15, 5), (5, 0, -3, 40)] {
        let ranges = sliding_window(&times, window, multiplicity, left, right).unwrap();
        for pair in ranges.windows(2) {
            assert!(pair[0].start() <= pair[0].stop());
            assert!(pair[0].stop() < pair[1].start(), "{:?}", pair);
        }
    }
}
