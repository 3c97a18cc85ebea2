//! Fixed-delay pair sweep.
//!
//! Counts coincidences between two sorted timestamp streams at a single
//! known delay, pairing events one-for-one: each event participates in at
//! most one coincidence, matching the physical picture of a photon pair
//! producing exactly one click per detector. The delay scan in
//! [`crate::delay_scan`] deliberately uses the other, cross-product
//! definition; the two are not interchangeable.
//!
//! ## Example
//!
//! ```rust
//! use coinc_core::pair_sweep::count_pairs_at_delay;
//!
//! let ch1 = vec![0, 1_000, 2_000];
//! let ch2 = vec![55, 1_045, 2_040];
//! assert_eq!(count_pairs_at_delay(&ch1, &ch2, 100, 0), 3);
//! assert_eq!(count_pairs_at_delay(&ch1, &ch2, 10, 0), 0);
//! ```

use crate::types::Timestamp;

/// Count coincidences between `ch1` and `ch2` at `delay_ps`, where a pair
/// matches when `|ch1[i] - delay_ps - ch2[j]| <= window_ps`.
///
/// Both inputs must be sorted in non-decreasing order. Each matched pair
/// consumes one event from each side.
pub fn count_pairs_at_delay(
    ch1: &[Timestamp],
    ch2: &[Timestamp],
    window_ps: Timestamp,
    delay_ps: Timestamp,
) -> i32 {
    let mut count = 0;
    let mut i = 0;
    let mut j = 0;

    while i < ch1.len() && j < ch2.len() {
        let diff = (ch1[i] - delay_ps) - ch2[j];
        if diff < -window_ps {
            i += 1;
        } else if diff > window_ps {
            j += 1;
        } else {
            count += 1;
            i += 1;
            j += 1;
        }
    }
    count
}

/// Like [`count_pairs_at_delay`] but returns the matched `(t1, t2)`
/// timestamp pairs in consumption order, for event dumps.
pub fn collect_pairs_at_delay(
    ch1: &[Timestamp],
    ch2: &[Timestamp],
    window_ps: Timestamp,
    delay_ps: Timestamp,
) -> Vec<(Timestamp, Timestamp)> {
    let mut pairs = Vec::new();
    let mut i = 0;
    let mut j = 0;

    while i < ch1.len() && j < ch2.len() {
        let diff = (ch1[i] - delay_ps) - ch2[j];
        if diff < -window_ps {
            i += 1;
        } else if diff > window_ps {
            j += 1;
        } else {
            pairs.push((ch1[i], ch2[j]));
            i += 1;
            j += 1;
        }
    }
    pairs
}
