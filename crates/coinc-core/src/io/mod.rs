//! Singles ingestion and scan-result output.
//!
//! Two on-disk formats produce singles: plain CSV event lists and the
//! time-tagger binary dump. Both readers share the same bookkeeping: the
//! first valid timestamp becomes the origin, stored timestamps are offsets
//! from it, and each event lands in the slice `floor(offset / width)` of its
//! channel. The slice width is a per-call option rather than process state.
//!
//! ## Example
//!
//! ```rust,no_run
//! use coinc_core::io::{read_file_auto, IngestOptions};
//!
//! let ingested = read_file_auto("run_042.bin".as_ref(), &IngestOptions::default()).unwrap();
//! println!("{} channels over {:.1} s", ingested.channels.len(), ingested.duration_secs);
//! ```

mod bin;
mod csv;

pub use self::bin::read_bin_singles;
pub use self::csv::read_csv_singles;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::singles::{Singles, SinglesMap};
use crate::types::{CoincError, CoincResult, ScanPoint, Timestamp, PS_PER_SECOND};

/// Highest channel index accepted by the readers.
pub const MAX_CHANNELS: u16 = 8;

/// Ingestion options.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IngestOptions {
    /// Width of one time slice in seconds. Values below one nanosecond fall
    /// back to the one-second default.
    pub bucket_width_secs: f64,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            bucket_width_secs: 1.0,
        }
    }
}

impl IngestOptions {
    pub fn new(bucket_width_secs: f64) -> Self {
        Self { bucket_width_secs }
    }

    /// Effective slice width in picoseconds.
    pub fn bucket_width_ps(&self) -> i64 {
        let secs = if self.bucket_width_secs > 1e-9 {
            self.bucket_width_secs
        } else {
            1.0
        };
        (secs * PS_PER_SECOND as f64).round() as i64
    }
}

/// Result of reading one file: singles per channel plus the measurement
/// duration derived from the raw timestamp span.
#[derive(Debug, Clone, Default)]
pub struct IngestedSingles {
    pub channels: SinglesMap,
    pub duration_secs: f64,
}

/// Read a singles file, dispatching on the `.bin` suffix.
pub fn read_file_auto(path: &Path, options: &IngestOptions) -> CoincResult<IngestedSingles> {
    if path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("bin"))
    {
        read_bin_singles(path, options)
    } else {
        read_csv_singles(path, options)
    }
}

/// Write scan results as `delay_ns,count` rows.
pub fn write_scan_csv(path: &Path, results: &[ScanPoint]) -> CoincResult<()> {
    let file = File::create(path).map_err(|source| CoincError::FileOpen {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    for point in results {
        writeln!(writer, "{},{}", point.delay_ns, point.count)?;
    }
    writer.flush()?;
    Ok(())
}

/// Shared accumulation state for the file readers.
pub(crate) struct SinglesBuilder {
    bucket_width_ps: i64,
    origin: Option<Timestamp>,
    min_ts: Timestamp,
    max_ts: Timestamp,
    channels: [Singles; MAX_CHANNELS as usize],
}

impl SinglesBuilder {
    pub(crate) fn new(options: &IngestOptions) -> Self {
        Self {
            bucket_width_ps: options.bucket_width_ps(),
            origin: None,
            min_ts: Timestamp::MAX,
            max_ts: Timestamp::MIN,
            channels: std::array::from_fn(|i| Singles::new(i as u8 + 1)),
        }
    }

    /// Record one raw event, silently discarding invalid ones (timestamp
    /// zero or channel outside 1..=MAX_CHANNELS).
    pub(crate) fn record(&mut self, ts: Timestamp, channel: u16) {
        if ts == 0 || channel == 0 || channel > MAX_CHANNELS {
            return;
        }
        let origin = *self.origin.get_or_insert(ts);
        let offset = ts - origin;
        let slice = offset.div_euclid(self.bucket_width_ps);
        self.channels[(channel - 1) as usize].push_event(slice, offset);
        self.min_ts = self.min_ts.min(ts);
        self.max_ts = self.max_ts.max(ts);
    }

    pub(crate) fn finish(self) -> IngestedSingles {
        let mut channels = SinglesMap::new();
        for singles in self.channels {
            if !singles.is_empty() {
                channels.insert(singles.channel(), singles);
            }
        }
        let duration_secs = if self.max_ts > self.min_ts {
            (self.max_ts - self.min_ts) as f64 * 1e-12
        } else {
            0.0
        };
        IngestedSingles {
            channels,
            duration_secs,
        }
    }
}
