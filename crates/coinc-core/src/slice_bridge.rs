//! Slice-boundary bridging for coincidence sweeps.
//!
//! A sweep over one slice cannot see events in the next slice, so a pair
//! whose two events straddle the boundary would be lost. Because the
//! coincidence window is normally far smaller than a slice, it is enough to
//! let the sweep see the first event of the following slice. When slices are
//! narrower than the window, more than one event can still pair with the
//! tail of the current slice, so bridging keeps appending until the first
//! event beyond `last_of_current + window`.
//!
//! ## Example
//!
//! ```rust
//! use coinc_core::slice_bridge::bridge_next_slice;
//!
//! let current = vec![100, 900];
//! let next = vec![1_020, 5_000];
//! let mut scratch = Vec::new();
//! let view = bridge_next_slice(&current, &next, 150, &mut scratch);
//! assert_eq!(view, &[100, 900, 1_020]);
//! ```

use crate::types::Timestamp;

/// Return a read-only view over `current`, extended with the leading events
/// of `next` that can still pair with the tail of `current`.
///
/// When `next` is empty the view aliases `current` directly and `scratch` is
/// left untouched apart from being cleared for an empty input. Otherwise the
/// view points into `scratch`, which is overwritten.
pub fn bridge_next_slice<'a>(
    current: &'a [Timestamp],
    next: &[Timestamp],
    window_ps: Timestamp,
    scratch: &'a mut Vec<Timestamp>,
) -> &'a [Timestamp] {
    if next.is_empty() {
        if current.is_empty() {
            scratch.clear();
            return &[];
        }
        return current;
    }

    scratch.clear();
    scratch.extend_from_slice(current);
    scratch.push(next[0]);
    if let Some(&last) = current.last() {
        for &ts in &next[1..] {
            if ts > last + window_ps {
                break;
            }
            scratch.push(ts);
        }
    }
    scratch
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_next_aliases_current() {
        let current = vec![10, 20, 30];
        let mut scratch = vec![99];
        let view = bridge_next_slice(&current, &[], 100, &mut scratch);
        assert_eq!(view, current.as_slice());
        assert!(std::ptr::eq(view.as_ptr(), current.as_ptr()));
    }

    #[test]
    fn test_both_empty() {
        let mut scratch = vec![1, 2];
        let view = bridge_next_slice(&[], &[], 100, &mut scratch);
        assert!(view.is_empty());
    }

    #[test]
    fn test_appends_first_of_next() {
        let current = vec![100, 200];
        let next = vec![100_000, 100_050];
        let mut scratch = Vec::new();
        let view = bridge_next_slice(&current, &next, 75, &mut scratch);
        // Far beyond the window, but the first event always comes along.
        assert_eq!(view, &[100, 200, 100_000]);
    }

    #[test]
    fn test_narrow_slice_pulls_several_events() {
        // Slice width smaller than the window: everything reachable from the
        // tail of `current` must be visible to the sweep.
        let current = vec![0, 40];
        let next = vec![60, 80, 120, 200];
        let mut scratch = Vec::new();
        let view = bridge_next_slice(&current, &next, 100, &mut scratch);
        assert_eq!(view, &[0, 40, 60, 80, 120]);
    }

    #[test]
    fn test_empty_current_still_exposes_next_head() {
        let next = vec![500, 600];
        let mut scratch = Vec::new();
        let view = bridge_next_slice(&[], &next, 100, &mut scratch);
        assert_eq!(view, &[500]);
    }

    #[test]
    fn test_boundary_pair_needs_bridging() {
        use crate::pair_sweep::count_pairs_at_delay;

        // Channel A fires just before the slice edge, channel B just after:
        // only the bridged view lets the sweep see the pair.
        let a_slice = vec![999_999_999_980];
        let b_slice: Vec<i64> = Vec::new();
        let b_next = vec![1_000_000_000_020];
        let mut scratch = Vec::new();
        let bridged = bridge_next_slice(&b_slice, &b_next, 75, &mut scratch);
        assert_eq!(count_pairs_at_delay(&a_slice, bridged, 75, 0), 1);
        assert_eq!(count_pairs_at_delay(&a_slice, &b_slice, 75, 0), 0);
    }

    #[test]
    fn test_next_slice_event_beyond_window_cannot_pair() {
        use crate::pair_sweep::count_pairs_at_delay;

        // The next-slice events are more than a window past B's last event,
        // so bridging changes nothing: A's only event pairs once either way.
        let a = vec![990_000_000_050];
        let b_current = vec![990_000_000_000];
        let b_next = vec![990_000_000_100, 990_000_000_200];
        let mut scratch = Vec::new();
        let bridged = bridge_next_slice(&b_current, &b_next, 75, &mut scratch);
        assert_eq!(bridged, &[990_000_000_000, 990_000_000_100]);
        assert_eq!(count_pairs_at_delay(&a, bridged, 75, 0), 1);
        assert_eq!(count_pairs_at_delay(&a, &b_current, 75, 0), 1);
    }
}
