//! Core types for coincidence counting.
//!
//! Every timestamp and delay inside the engine is a signed 64-bit count of
//! picoseconds. Nanoseconds exist only at the boundaries: delay ranges come
//! in from the command line as nanoseconds and scan results expose their
//! x axis as nanoseconds. The conversion helpers here are the only places
//! where that translation happens.

use serde::{Deserialize, Serialize};

/// Raw detector timestamp (or delay) in picoseconds.
pub type Timestamp = i64;

/// Detector channel identifier, 1-based.
pub type ChannelId = u8;

/// Picoseconds per nanosecond.
pub const PS_PER_NS: i64 = 1_000;

/// Picoseconds per second.
pub const PS_PER_SECOND: i64 = 1_000_000_000_000;

/// Result type for coincidence operations.
pub type CoincResult<T> = Result<T, CoincError>;

/// Errors reported by the coincidence engine.
#[derive(Debug, thiserror::Error)]
pub enum CoincError {
    #[error("delay step must be positive, got {0} ps")]
    InvalidDelayStep(i64),

    #[error("at least two channels required for coincidences, got {0}")]
    TooFewChannels(usize),

    #[error("offsets length {offsets} does not match channel count {channels}")]
    OffsetsMismatch { offsets: usize, channels: usize },

    #[error("cannot open {path}: {source}")]
    FileOpen {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// One point of a delay scan: delay on the x axis in nanoseconds, number of
/// coincidences on the y axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanPoint {
    /// Delay in nanoseconds.
    pub delay_ns: f32,
    /// Coincidence count at this delay.
    pub count: i32,
}

/// Convert a nanosecond value from an external boundary into picoseconds.
#[inline]
pub fn ns_to_ps(ns: f64) -> Timestamp {
    (ns * PS_PER_NS as f64).round() as Timestamp
}

/// Convert a picosecond delay into the nanosecond x coordinate of a scan.
#[inline]
pub fn ps_to_ns(ps: Timestamp) -> f32 {
    ps as f32 / PS_PER_NS as f32
}
