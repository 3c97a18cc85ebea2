//! Delay histogram scan over a uniform delay grid.
//!
//! Computes, for every delay on a grid, how many event pairs of two sorted
//! timestamp streams fall within the coincidence window once one stream is
//! shifted by that delay. Scanning each grid point with a separate sweep
//! would cost O(grid * events); instead a single pass over the first stream
//! walks a monotone window over the second and records each pair's 2w-wide
//! delay interval in a difference array, so a pair costs O(1) regardless of
//! how many grid points it covers. A prefix sum turns the difference array
//! into the final counts.
//!
//! The counts here are cross-product counts: a pair contributes to every
//! delay it is compatible with, and one event can appear in several pairs.
//! That makes the histogram smooth in the delay and the right tool for peak
//! finding. Reporting at a fixed delay uses the one-for-one sweep in
//! [`crate::pair_sweep`] instead.
//!
//! ## Example
//!
//! ```rust
//! use coinc_core::delay_scan::{scan_delay_range, DelayGrid};
//!
//! let ch1 = vec![0, 1_000, 2_000, 3_000, 4_000];
//! let ch2 = vec![50, 1_050, 2_050, 3_050, 4_050];
//! let grid = DelayGrid::new(-200, 200, 50);
//! let result = scan_delay_range(&ch1, &ch2, 100, grid).unwrap();
//! assert_eq!(result.len(), 9);
//! // At a 50 ps shift every pair is still inside the 100 ps window.
//! assert_eq!(result[5].delay_ns, 0.05);
//! assert_eq!(result[5].count, 5);
//! ```

use serde::{Deserialize, Serialize};

use crate::types::{ps_to_ns, CoincError, CoincResult, ScanPoint, Timestamp, PS_PER_NS};

/// Uniform grid of candidate delays, all in picoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayGrid {
    /// First candidate delay.
    pub start_ps: i64,
    /// Last candidate delay (inclusive when reachable from `start_ps`).
    pub end_ps: i64,
    /// Spacing between candidates; must be positive.
    pub step_ps: i64,
}

impl DelayGrid {
    /// Grid from picosecond bounds.
    pub fn new(start_ps: i64, end_ps: i64, step_ps: i64) -> Self {
        Self {
            start_ps,
            end_ps,
            step_ps,
        }
    }

    /// Grid from nanosecond bounds as supplied at external boundaries.
    pub fn from_ns(start_ns: f64, end_ns: f64, step_ns: f64) -> Self {
        Self {
            start_ps: crate::types::ns_to_ps(start_ns),
            end_ps: crate::types::ns_to_ps(end_ns),
            step_ps: crate::types::ns_to_ps(step_ns),
        }
    }

    /// Number of grid points; zero when `end_ps < start_ps`.
    ///
    /// Only meaningful for a positive step.
    pub fn point_count(&self) -> usize {
        if self.end_ps < self.start_ps {
            0
        } else {
            ((self.end_ps - self.start_ps) / self.step_ps + 1) as usize
        }
    }

    /// Delay at grid point `index`.
    pub fn delay_at(&self, index: usize) -> Timestamp {
        self.start_ps + index as i64 * self.step_ps
    }

    fn validate(&self) -> CoincResult<()> {
        if self.step_ps <= 0 {
            return Err(CoincError::InvalidDelayStep(self.step_ps));
        }
        Ok(())
    }
}

/// Reusable delay scanner.
///
/// Holds the difference array between scans so a driver sweeping many
/// slice/pair combinations does not reallocate per call.
#[derive(Debug, Default)]
pub struct DelayScanner {
    diff: Vec<i64>,
}

impl DelayScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan `grid` and fill `results` with one [`ScanPoint`] per grid point,
    /// counting all pairs `(i, j)` with
    /// `|ch1[i] - delay - ch2[j]| <= window_ps` at each delay.
    ///
    /// Both inputs must be sorted. `results` is cleared first; on success it
    /// holds exactly `grid.point_count()` entries in grid order. Empty
    /// inputs produce all-zero counts.
    pub fn scan_into(
        &mut self,
        ch1: &[Timestamp],
        ch2: &[Timestamp],
        window_ps: Timestamp,
        grid: DelayGrid,
        results: &mut Vec<ScanPoint>,
    ) -> CoincResult<()> {
        results.clear();
        grid.validate()?;
        let steps = grid.point_count();
        if steps == 0 {
            return Ok(());
        }

        if ch1.is_empty() || ch2.is_empty() {
            results.extend((0..steps).map(|k| ScanPoint {
                delay_ns: ps_to_ns(grid.delay_at(k)),
                count: 0,
            }));
            return Ok(());
        }

        // One extra cell keeps the `idx_end + 1` write in bounds.
        self.diff.clear();
        self.diff.resize(steps + 1, 0);

        let min_needed = grid.start_ps - window_ps;
        let max_needed = grid.end_ps + window_ps;
        let mut j_lo = 0usize;
        let mut j_hi = 0usize;

        for &t1 in ch1 {
            // ch2[j_lo..j_hi] stays aligned with the timestamps that can
            // still pair with t1 somewhere on the grid.
            let low_cut = t1 - max_needed;
            while j_lo < ch2.len() && ch2[j_lo] < low_cut {
                j_lo += 1;
            }
            if j_hi < j_lo {
                j_hi = j_lo;
            }
            let high_cut = t1 - min_needed;
            while j_hi < ch2.len() && ch2[j_hi] <= high_cut {
                j_hi += 1;
            }
            debug_assert!(j_lo <= j_hi);

            for &t2 in &ch2[j_lo..j_hi] {
                let center = t1 - t2;
                let interval_lo = center - window_ps;
                let interval_hi = center + window_ps;
                if interval_hi < grid.start_ps || interval_lo > grid.end_ps {
                    continue;
                }
                let offset_lo = interval_lo.max(grid.start_ps) - grid.start_ps;
                let offset_hi = interval_hi.min(grid.end_ps) - grid.start_ps;

                // idx_start is the first grid point inside the interval,
                // idx_end the last; integer ceiling keeps this exact.
                let idx_start = ((offset_lo + grid.step_ps - 1) / grid.step_ps) as usize;
                let idx_end = (offset_hi / grid.step_ps) as usize;
                if idx_start > idx_end || idx_end >= steps {
                    continue;
                }
                self.diff[idx_start] += 1;
                self.diff[idx_end + 1] -= 1;
            }
        }

        results.reserve(steps);
        let mut running = 0i64;
        for k in 0..steps {
            running += self.diff[k];
            results.push(ScanPoint {
                delay_ns: ps_to_ns(grid.delay_at(k)),
                count: running as i32,
            });
        }
        Ok(())
    }

    /// Scan `grid` and return the delay with the maximum count, in
    /// picoseconds. The first occurrence wins on ties; an empty grid yields
    /// `grid.start_ps`. The scan itself is left in `results`.
    pub fn best_delay_ps(
        &mut self,
        reference: &[Timestamp],
        target: &[Timestamp],
        window_ps: Timestamp,
        grid: DelayGrid,
        results: &mut Vec<ScanPoint>,
    ) -> CoincResult<Timestamp> {
        self.scan_into(reference, target, window_ps, grid, results)?;

        let mut best_delay = grid.start_ps;
        let mut best_count = i32::MIN;
        for point in results.iter() {
            if point.count > best_count {
                best_count = point.count;
                // Recover the exact grid delay from the nanosecond axis so
                // the returned value matches what callers will see plotted.
                best_delay = (f64::from(point.delay_ns) * PS_PER_NS as f64).round() as Timestamp;
            }
        }
        Ok(best_delay)
    }
}

/// One-shot convenience wrapper around [`DelayScanner::scan_into`].
pub fn scan_delay_range(
    ch1: &[Timestamp],
    ch2: &[Timestamp],
    window_ps: Timestamp,
    grid: DelayGrid,
) -> CoincResult<Vec<ScanPoint>> {
    let mut results = Vec::new();
    DelayScanner::new().scan_into(ch1, ch2, window_ps, grid, &mut results)?;
    Ok(results)
}

/// One-shot convenience wrapper around [`DelayScanner::best_delay_ps`].
pub fn find_best_delay_ps(
    reference: &[Timestamp],
    target: &[Timestamp],
    window_ps: Timestamp,
    grid: DelayGrid,
) -> CoincResult<Timestamp> {
    let mut results = Vec::new();
    DelayScanner::new().best_delay_ps(reference, target, window_ps, grid, &mut results)
}
