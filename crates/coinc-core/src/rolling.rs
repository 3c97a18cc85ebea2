//! Rolling retention window over per-channel singles.
//!
//! Live viewers ingest data in chunks and only ever look at the recent past.
//! [`RollingSingles`] merges incoming chunks into per-channel singles and
//! prunes every bucket older than a configurable number of slices behind the
//! newest slice seen so far. The most recent chunk is additionally kept
//! verbatim per channel, unmerged, for per-chunk displays.
//!
//! ## Example
//!
//! ```rust
//! use coinc_core::rolling::RollingSingles;
//! use coinc_core::singles::{Singles, SinglesMap};
//!
//! let mut chunk = SinglesMap::new();
//! let mut ch1 = Singles::new(1);
//! ch1.push_event(0, 100);
//! ch1.push_event(1, 1_000_000_000_100);
//! chunk.insert(1, ch1);
//!
//! let mut rolling = RollingSingles::new(3);
//! rolling.append_chunk(&chunk);
//! assert_eq!(rolling.latest_slice(), Some(1));
//! assert_eq!(rolling.channel_singles(1).total_events(), 2);
//! ```

use std::collections::BTreeMap;

use crate::singles::{Singles, SinglesMap};
use crate::types::{ChannelId, Timestamp};

/// Default retention horizon in slices.
pub const DEFAULT_WINDOW_SLICES: i64 = 200;

static EMPTY_SINGLES: Singles = Singles::empty();

/// Per-channel singles restricted to the trailing `window_slices` slices.
#[derive(Debug, Clone)]
pub struct RollingSingles {
    window_slices: i64,
    channels: BTreeMap<ChannelId, Singles>,
    latest_chunks: BTreeMap<ChannelId, Vec<Vec<Timestamp>>>,
    latest_slice: Option<i64>,
}

impl Default for RollingSingles {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SLICES)
    }
}

impl RollingSingles {
    /// Create an empty rolling store keeping at least one slice.
    pub fn new(window_slices: i64) -> Self {
        Self {
            window_slices: window_slices.max(1),
            channels: BTreeMap::new(),
            latest_chunks: BTreeMap::new(),
            latest_slice: None,
        }
    }

    /// Merge one ingested chunk into the store, then prune.
    ///
    /// For every channel in the chunk the raw per-slice buckets are recorded
    /// as that channel's latest chunk, each slice's events are appended in
    /// order onto the stored singles, and the newest slice index is tracked.
    pub fn append_chunk(&mut self, chunk: &SinglesMap) {
        for (&channel, incoming) in chunk {
            if incoming.is_empty() {
                continue;
            }
            self.latest_chunks
                .insert(channel, incoming.buckets().to_vec());

            let target = self
                .channels
                .entry(channel)
                .or_insert_with(|| Singles::new(incoming.channel()));
            let base = incoming.base_slice();
            for (idx, bucket) in incoming.buckets().iter().enumerate() {
                let slice = base + idx as i64;
                self.latest_slice = Some(self.latest_slice.map_or(slice, |cur| cur.max(slice)));
                target.ensure_slice(slice).extend_from_slice(bucket);
            }
        }
        self.prune();
    }

    /// Drop buckets older than `latest_slice - window_slices + 1` from every
    /// stored channel. Channels that fall entirely behind the horizon become
    /// empty but stay registered. No-op before any data has arrived.
    pub fn prune(&mut self) {
        let Some(latest) = self.latest_slice else {
            return;
        };
        let min_slice = latest - self.window_slices + 1;
        for singles in self.channels.values_mut() {
            singles.drop_slices_before(min_slice);
        }
    }

    /// Change the retention horizon (clamped to at least one slice) and
    /// prune immediately.
    pub fn set_window(&mut self, window_slices: i64) {
        self.window_slices = window_slices.max(1);
        self.prune();
    }

    /// Merged singles for `channel`; an empty instance when unknown.
    pub fn channel_singles(&self, channel: ChannelId) -> &Singles {
        self.channels.get(&channel).unwrap_or(&EMPTY_SINGLES)
    }

    /// Raw buckets of the most recent chunk for `channel`; empty when the
    /// channel has never appeared in a chunk.
    pub fn latest_chunk(&self, channel: ChannelId) -> &[Vec<Timestamp>] {
        self.latest_chunks
            .get(&channel)
            .map_or(&[], Vec::as_slice)
    }

    /// Current retention horizon in slices.
    pub fn window_slices(&self) -> i64 {
        self.window_slices
    }

    /// Newest absolute slice index observed so far.
    pub fn latest_slice(&self) -> Option<i64> {
        self.latest_slice
    }

    /// All stored channels, keyed by channel id.
    pub fn channels(&self) -> &BTreeMap<ChannelId, Singles> {
        &self.channels
    }
}
