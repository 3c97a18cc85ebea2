//! # Coincidence Counting Engine
//!
//! Core algorithms for finding temporal coincidences in streams of
//! time-tagged photon detection events ("singles") from multi-channel
//! detectors. All timestamps are signed 64-bit picoseconds; a coincidence is
//! a pair (or K-tuple) of events that fall within a symmetric half-window of
//! each other after shifting one channel by a candidate delay.
//!
//! ## Components
//!
//! - **Singles storage**: per-channel events grouped into fixed-width time
//!   slices ([`singles`]), with a rolling retention variant for live use
//!   ([`rolling`]).
//! - **Pair sweep**: one-for-one coincidence counting at a fixed delay
//!   ([`pair_sweep`]), including the event collector for timetag dumps.
//! - **Delay scan**: cross-product coincidence counts over a whole grid of
//!   delays in a single difference-array pass, plus the peak locator
//!   ([`delay_scan`]).
//! - **N-fold counting**: sliding-window coverage counter across three or
//!   more channels ([`nfold`]).
//! - **Slice bridging**: lets a per-slice sweep see just enough of the next
//!   slice to keep boundary-crossing pairs ([`slice_bridge`]).
//! - **Ingestion**: CSV and binary singles readers ([`io`]).
//!
//! ## Data Flow
//!
//! ```text
//! file -> io::read_file_auto -> SinglesMap -> per (pair, slice):
//!     slice_bridge -> delay_scan (peak finding)
//!                  -> pair_sweep (reporting at the chosen delay)
//!                  -> nfold      (multi-channel rates)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use coinc_core::delay_scan::{find_best_delay_ps, DelayGrid};
//! use coinc_core::pair_sweep::count_pairs_at_delay;
//!
//! // Channel 2 trails channel 1 by roughly 1.25 ns.
//! let ch1: Vec<i64> = (0..20).map(|i| i * 100_000).collect();
//! let ch2: Vec<i64> = ch1
//!     .iter()
//!     .enumerate()
//!     .map(|(i, t)| t + 1_250 + if i % 2 == 0 { -200 } else { 200 })
//!     .collect();
//!
//! let grid = DelayGrid::from_ns(-3.0, 3.0, 0.025);
//! let best = find_best_delay_ps(&ch2, &ch1, 200, grid).unwrap();
//! assert_eq!(best, 1_250);
//! assert_eq!(count_pairs_at_delay(&ch2, &ch1, 200, best), 20);
//! ```

pub mod delay_scan;
pub mod io;
pub mod nfold;
pub mod pair_sweep;
pub mod rolling;
pub mod singles;
pub mod slice_bridge;
pub mod types;

pub use delay_scan::{find_best_delay_ps, scan_delay_range, DelayGrid, DelayScanner};
pub use nfold::count_nfold;
pub use pair_sweep::{collect_pairs_at_delay, count_pairs_at_delay};
pub use rolling::RollingSingles;
pub use singles::{Singles, SinglesMap};
pub use slice_bridge::bridge_next_slice;
pub use types::{ChannelId, CoincError, CoincResult, ScanPoint, Timestamp};
