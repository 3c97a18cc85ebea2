//! Cross-module properties of the coincidence algorithms, checked against
//! independent reference implementations on randomized inputs.

use proptest::prelude::*;

use coinc_core::delay_scan::{scan_delay_range, DelayGrid};
use coinc_core::nfold::count_nfold;
use coinc_core::pair_sweep::count_pairs_at_delay;
use coinc_core::slice_bridge::bridge_next_slice;
use coinc_core::types::Timestamp;

/// Cross-product reference: every `(i, j)` within the window counts.
fn cross_count(ch1: &[Timestamp], ch2: &[Timestamp], window: Timestamp, delay: Timestamp) -> i32 {
    let mut count = 0;
    for &t1 in ch1 {
        for &t2 in ch2 {
            if (t1 - delay - t2).abs() <= window {
                count += 1;
            }
        }
    }
    count
}

/// Consuming reference, written as a single forward pass over `ch1` instead
/// of the symmetric two-pointer form: skip all partners that fell behind,
/// then claim the first one still in reach.
fn greedy_consuming_count(
    ch1: &[Timestamp],
    ch2: &[Timestamp],
    window: Timestamp,
    delay: Timestamp,
) -> i32 {
    let mut count = 0;
    let mut j = 0;
    for &t1 in ch1 {
        let shifted = t1 - delay;
        while j < ch2.len() && ch2[j] < shifted - window {
            j += 1;
        }
        if j < ch2.len() && ch2[j] <= shifted + window {
            count += 1;
            j += 1;
        }
    }
    count
}

fn sorted_timestamps(max_len: usize) -> impl Strategy<Value = Vec<Timestamp>> {
    proptest::collection::vec(0i64..2_000_000, 0..max_len).prop_map(|mut v| {
        v.sort_unstable();
        v
    })
}

/// Tightly packed variant so window/grid overlaps actually happen.
fn dense_timestamps(max_len: usize) -> impl Strategy<Value = Vec<Timestamp>> {
    proptest::collection::vec(0i64..50_000, 0..max_len).prop_map(|mut v| {
        v.sort_unstable();
        v
    })
}

proptest! {
    #[test]
    fn pair_sweep_matches_greedy_reference(
        ch1 in sorted_timestamps(150),
        ch2 in sorted_timestamps(150),
        window in 1i64..5_000,
        delay in -10_000i64..10_000,
    ) {
        prop_assert_eq!(
            count_pairs_at_delay(&ch1, &ch2, window, delay),
            greedy_consuming_count(&ch1, &ch2, window, delay)
        );
    }

    #[test]
    fn two_fold_equals_pair_sweep_at_zero_delay(
        ch1 in sorted_timestamps(150),
        ch2 in sorted_timestamps(150),
        window in 1i64..5_000,
    ) {
        prop_assert_eq!(
            count_nfold(&[&ch1, &ch2], window, None).unwrap(),
            count_pairs_at_delay(&ch1, &ch2, window, 0)
        );
    }

    #[test]
    fn scan_is_deterministic(
        ch1 in sorted_timestamps(80),
        ch2 in sorted_timestamps(80),
        window in 1i64..3_000,
    ) {
        let grid = DelayGrid::new(-5_000, 5_000, 125);
        let first = scan_delay_range(&ch1, &ch2, window, grid).unwrap();
        let second = scan_delay_range(&ch1, &ch2, window, grid).unwrap();
        prop_assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(&second) {
            prop_assert_eq!(a.delay_ns.to_bits(), b.delay_ns.to_bits());
            prop_assert_eq!(a.count, b.count);
        }
    }

    #[test]
    fn bridged_view_preserves_order_and_prefix(
        current in sorted_timestamps(50),
        gap in 0i64..500,
        tail in sorted_timestamps(20),
        window in 1i64..1_000,
    ) {
        // Build a next slice strictly after the current one.
        let base = current.last().copied().unwrap_or(0) + 1 + gap;
        let next: Vec<Timestamp> = tail.iter().map(|t| base + t).collect();
        let mut scratch = Vec::new();
        let view = bridge_next_slice(&current, &next, window, &mut scratch);

        prop_assert!(view.starts_with(&current));
        prop_assert!(view.windows(2).all(|w| w[0] <= w[1]));
        if next.is_empty() {
            prop_assert_eq!(view.len(), current.len());
        } else {
            prop_assert!(view.len() > current.len());
            prop_assert_eq!(view[current.len()], next[0]);
        }
    }
}

proptest! {
    // Checking every grid point against the quadratic reference is costly,
    // so this block runs fewer, smaller cases.
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn scan_matches_cross_count_at_every_grid_point(
        ch1 in dense_timestamps(40),
        ch2 in dense_timestamps(40),
        window in 1i64..3_000,
        start in -5_000i64..0,
        span in 0i64..4_000,
        step in 1i64..250,
    ) {
        let grid = DelayGrid::new(start, start + span, step);
        let result = scan_delay_range(&ch1, &ch2, window, grid).unwrap();
        prop_assert_eq!(result.len(), grid.point_count());
        for (k, point) in result.iter().enumerate() {
            let delay = grid.delay_at(k);
            prop_assert_eq!(
                point.count,
                cross_count(&ch1, &ch2, window, delay),
                "delay {} ps", delay
            );
        }
    }
}

#[test]
fn pair_and_scan_counts_agree_without_double_matchable_pairs() {
    // Events a window apart on a coarse lattice: no event can reach two
    // partners, so the consuming and cross-product definitions coincide on
    // the whole grid.
    let ch1: Vec<Timestamp> = (0..5).map(|i| i * 1_000).collect();
    let ch2: Vec<Timestamp> = ch1.iter().map(|t| t + 50).collect();
    let grid = DelayGrid::new(-200, 200, 50);
    let scan = scan_delay_range(&ch1, &ch2, 100, grid).unwrap();
    for (k, point) in scan.iter().enumerate() {
        let delay = grid.delay_at(k);
        assert_eq!(point.count, count_pairs_at_delay(&ch1, &ch2, 100, delay));
    }
}

#[test]
fn consuming_count_can_differ_from_cross_count() {
    // One event of ch1 sits between two of ch2: the sweep pairs it once,
    // the cross-product definition counts both combinations.
    let ch1 = vec![1_000];
    let ch2 = vec![950, 1_050];
    assert_eq!(count_pairs_at_delay(&ch1, &ch2, 100, 0), 1);
    assert_eq!(cross_count(&ch1, &ch2, 100, 0), 2);

    let grid = DelayGrid::new(0, 0, 1);
    let scan = scan_delay_range(&ch1, &ch2, 100, grid).unwrap();
    assert_eq!(scan[0].count, 2);
}
