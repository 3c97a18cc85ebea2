//! Shared plumbing for the coincidence drivers: argument parsing, the
//! detector pair tables and slice-range handling.
//!
//! Unit conventions at this boundary: the coincidence window arrives in
//! picoseconds, delay start/end/step in nanoseconds (converted to
//! picoseconds before touching the engine), slice indices as plain
//! integers.

pub mod logging;

use std::path::PathBuf;
use std::str::FromStr;

use coinc_core::delay_scan::DelayGrid;
use coinc_core::singles::{Singles, SinglesMap};
use coinc_core::slice_bridge::bridge_next_slice;
use coinc_core::types::{ChannelId, CoincError, Timestamp};

/// Channel pairs swept by the delay-scan driver: the four same-axis pairs
/// (H, V, D, A against their partners) followed by the four cross-axis
/// pairs used for visibility.
pub const SCAN_PAIRS: [(ChannelId, ChannelId); 8] = [
    (1, 5),
    (2, 6),
    (3, 7),
    (4, 8),
    (1, 6),
    (2, 5),
    (3, 8),
    (4, 7),
];

/// A labelled detector pair. `delay_source` names the same-axis pair whose
/// peak delay is reused when reporting this pair.
#[derive(Debug, Clone, Copy)]
pub struct PairSpec {
    pub ch1: ChannelId,
    pub ch2: ChannelId,
    pub label: &'static str,
    pub delay_source: &'static str,
}

const fn pair(
    ch1: ChannelId,
    ch2: ChannelId,
    label: &'static str,
    delay_source: &'static str,
) -> PairSpec {
    PairSpec {
        ch1,
        ch2,
        label,
        delay_source,
    }
}

/// Same-axis pairs; each one is its own delay source.
pub const SAME_PAIRS: [PairSpec; 4] = [
    pair(1, 5, "HH", "HH"),
    pair(2, 6, "VV", "VV"),
    pair(3, 7, "DD", "DD"),
    pair(4, 8, "AA", "AA"),
];

/// Cross-axis pairs, reporting at the matching same-axis delay.
pub const CROSS_PAIRS: [PairSpec; 4] = [
    pair(1, 6, "HV", "HH"),
    pair(2, 5, "VH", "VV"),
    pair(3, 8, "DA", "DD"),
    pair(4, 7, "AD", "AA"),
];

/// Driver-level failures.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// Bad command-line input; the driver prints usage alongside this.
    #[error("{0}")]
    Usage(String),

    /// The file parsed but holds nothing the driver can work with.
    #[error("{0}")]
    Data(String),

    #[error(transparent)]
    Coinc(#[from] CoincError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The seven positional arguments shared by both drivers.
#[derive(Debug, Clone)]
pub struct ScanArgs {
    pub file: PathBuf,
    pub window_ps: i64,
    pub delay_start_ns: f64,
    pub delay_end_ns: f64,
    pub delay_step_ns: f64,
    pub start_slice: i64,
    pub stop_slice: i64,
}

impl ScanArgs {
    /// Parse and validate `<file> <window_ps> <start_ns> <end_ns> <step_ns>
    /// <start_slice> <stop_slice>` from the arguments following the program
    /// name.
    pub fn parse(args: &[String]) -> Result<Self, DriverError> {
        if args.len() < 7 {
            return Err(DriverError::Usage(
                "expected 7 positional arguments".into(),
            ));
        }

        let parsed = Self {
            file: PathBuf::from(&args[0]),
            window_ps: parse_field(&args[1], "coinc_window_ps")?,
            delay_start_ns: parse_field(&args[2], "delay_start_ns")?,
            delay_end_ns: parse_field(&args[3], "delay_end_ns")?,
            delay_step_ns: parse_field(&args[4], "delay_step_ns")?,
            start_slice: parse_field(&args[5], "start_slice")?,
            stop_slice: parse_field(&args[6], "stop_slice")?,
        };

        if parsed.window_ps <= 0 {
            return Err(DriverError::Usage(
                "coincidence window must be positive".into(),
            ));
        }
        if parsed.delay_step_ns <= 0.0 {
            return Err(DriverError::Usage("delay_step must be positive".into()));
        }
        if parsed.delay_end_ns < parsed.delay_start_ns {
            return Err(DriverError::Usage(
                "delay_end must be >= delay_start".into(),
            ));
        }
        if parsed.start_slice < 0 || parsed.stop_slice < 0 {
            return Err(DriverError::Usage(
                "start_slice/stop_slice must be non-negative".into(),
            ));
        }
        if parsed.start_slice > parsed.stop_slice {
            return Err(DriverError::Usage(
                "start_slice must be <= stop_slice".into(),
            ));
        }
        if parsed.delay_grid().step_ps <= 0 {
            return Err(DriverError::Usage(
                "delay_step too small once converted to picoseconds".into(),
            ));
        }
        Ok(parsed)
    }

    /// The delay grid in picoseconds.
    pub fn delay_grid(&self) -> DelayGrid {
        DelayGrid::from_ns(self.delay_start_ns, self.delay_end_ns, self.delay_step_ns)
    }
}

fn parse_field<T: FromStr>(token: &str, name: &str) -> Result<T, DriverError> {
    token
        .trim()
        .parse()
        .map_err(|_| DriverError::Usage(format!("invalid {name}: '{token}'")))
}

/// The slice span `[first, last]` covered by any channel's data.
pub fn data_slice_range(channels: &SinglesMap) -> Option<(i64, i64)> {
    let mut range: Option<(i64, i64)> = None;
    for singles in channels.values() {
        let (Some(first), Some(last)) = (singles.first_slice(), singles.last_slice()) else {
            continue;
        };
        range = Some(match range {
            None => (first, last),
            Some((lo, hi)) => (lo.min(first), hi.max(last)),
        });
    }
    range
}

/// Intersect the requested slice range with the available data range.
pub fn clamp_slice_range(requested: (i64, i64), data: (i64, i64)) -> Option<(i64, i64)> {
    let lo = requested.0.max(data.0);
    let hi = requested.1.min(data.1);
    (lo <= hi).then_some((lo, hi))
}

/// Events of `slice` in `singles`, bridged across the upper slice boundary.
pub fn bridged_slice<'a>(
    singles: &'a Singles,
    slice: i64,
    window_ps: Timestamp,
    scratch: &'a mut Vec<Timestamp>,
) -> &'a [Timestamp] {
    bridge_next_slice(
        singles.events_for_slice(slice),
        singles.events_for_slice(slice + 1),
        window_ps,
        scratch,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_valid_arguments() {
        let parsed =
            ScanArgs::parse(&args(&["run.bin", "250", "-8", "12", "0.01", "0", "600"])).unwrap();
        assert_eq!(parsed.window_ps, 250);
        assert_eq!(parsed.delay_start_ns, -8.0);
        assert_eq!(parsed.stop_slice, 600);
        let grid = parsed.delay_grid();
        assert_eq!(grid.start_ps, -8_000);
        assert_eq!(grid.end_ps, 12_000);
        assert_eq!(grid.step_ps, 10);
    }

    #[test]
    fn test_parse_rejects_bad_values() {
        let base = ["run.bin", "250", "0", "10", "0.5", "0", "10"];
        let cases: &[(usize, &str)] = &[
            (1, "0"),      // window must be positive
            (1, "abc"),    // window not a number
            (4, "0"),      // step must be positive
            (4, "0.0001"), // step under one picosecond
            (3, "-20"),    // end before start
            (5, "-1"),     // negative slice
        ];
        for &(idx, bad) in cases {
            let mut mutated = base;
            mutated[idx] = bad;
            assert!(
                matches!(
                    ScanArgs::parse(&args(&mutated)),
                    Err(DriverError::Usage(_))
                ),
                "argument {idx} = '{bad}' should be rejected"
            );
        }
        let swapped = ["run.bin", "250", "0", "10", "0.5", "9", "3"];
        assert!(ScanArgs::parse(&args(&swapped)).is_err());
        assert!(ScanArgs::parse(&args(&base[..5])).is_err());
    }

    #[test]
    fn test_clamp_slice_range() {
        assert_eq!(clamp_slice_range((0, 600), (5, 20)), Some((5, 20)));
        assert_eq!(clamp_slice_range((10, 15), (5, 20)), Some((10, 15)));
        assert_eq!(clamp_slice_range((0, 3), (5, 20)), None);
        assert_eq!(clamp_slice_range((25, 30), (5, 20)), None);
    }

    #[test]
    fn test_data_slice_range() {
        let mut channels = SinglesMap::new();
        assert_eq!(data_slice_range(&channels), None);

        let mut a = Singles::new(1);
        a.push_event(3, 1);
        a.push_event(7, 2);
        channels.insert(1, a);
        let mut b = Singles::new(5);
        b.push_event(1, 3);
        channels.insert(5, b);
        assert_eq!(data_slice_range(&channels), Some((1, 7)));
    }

    #[test]
    fn test_pair_tables_are_consistent() {
        for spec in CROSS_PAIRS {
            assert!(
                SAME_PAIRS.iter().any(|s| s.label == spec.delay_source),
                "{} has no delay source",
                spec.label
            );
        }
        for (same, scan) in SAME_PAIRS.iter().zip(SCAN_PAIRS) {
            assert_eq!((same.ch1, same.ch2), scan);
        }
    }

    #[test]
    fn test_bridged_slice_reaches_into_next() {
        let mut singles = Singles::new(1);
        singles.push_event(0, 999_999_999_900);
        singles.push_event(1, 1_000_000_000_050);
        let mut scratch = Vec::new();
        let view = bridged_slice(&singles, 0, 200, &mut scratch);
        assert_eq!(view, &[999_999_999_900, 1_000_000_000_050]);
    }
}
