//! N-fold coincidence counting across two or more channels.
//!
//! Merges all channels into one time-ordered stream of tagged events, then
//! slides a window across it while tracking how many distinct channels are
//! represented inside. Whenever all channels are present at once, one
//! coincidence is recorded and the window's left edge advances, so dense
//! input cannot produce overlapping counts.
//!
//! ## Example
//!
//! ```rust
//! use coinc_core::nfold::count_nfold;
//!
//! let ch1 = vec![0, 10_000, 20_000];
//! let ch2 = vec![20, 10_020, 20_020];
//! let ch3 = vec![35, 10_035, 20_035];
//! let count = count_nfold(&[&ch1, &ch2, &ch3], 100, None).unwrap();
//! assert_eq!(count, 3);
//! ```

use crate::pair_sweep::count_pairs_at_delay;
use crate::types::{CoincError, CoincResult, Timestamp};

#[derive(Debug, Clone, Copy)]
struct Tagged {
    timestamp: Timestamp,
    channel: usize,
}

/// Count events where all `channels` fire within `window_ps` of each other.
///
/// Each channel's events must be sorted. `offsets_ps`, when present, shifts
/// channel `k` by `offsets_ps[k]` before merging; an empty offsets slice is
/// treated as absent. With exactly two channels and no offsets this reduces
/// to the one-for-one pair sweep at zero delay.
pub fn count_nfold(
    channels: &[&[Timestamp]],
    window_ps: Timestamp,
    offsets_ps: Option<&[Timestamp]>,
) -> CoincResult<i32> {
    if channels.len() < 2 {
        return Err(CoincError::TooFewChannels(channels.len()));
    }
    let offsets = offsets_ps.filter(|o| !o.is_empty());
    if let Some(offsets) = offsets {
        if offsets.len() != channels.len() {
            return Err(CoincError::OffsetsMismatch {
                offsets: offsets.len(),
                channels: channels.len(),
            });
        }
    }
    if channels.len() == 2 && offsets.is_none() {
        return Ok(count_pairs_at_delay(channels[0], channels[1], window_ps, 0));
    }

    let total: usize = channels.iter().map(|ch| ch.len()).sum();
    if total == 0 {
        return Ok(0);
    }

    let mut merged = Vec::with_capacity(total);
    for (channel, events) in channels.iter().enumerate() {
        let offset = offsets.map_or(0, |o| o[channel]);
        merged.extend(events.iter().map(|&ts| Tagged {
            timestamp: ts + offset,
            channel,
        }));
    }
    merged.sort_unstable_by_key(|event| (event.timestamp, event.channel));

    let mut freq = vec![0u32; channels.len()];
    let mut have = 0usize;
    let mut left = 0usize;
    let mut coincidences = 0;

    for right in 0..merged.len() {
        let channel = merged[right].channel;
        freq[channel] += 1;
        if freq[channel] == 1 {
            have += 1;
        }

        while merged[right].timestamp - merged[left].timestamp > window_ps && left < right {
            let evicted = merged[left].channel;
            freq[evicted] -= 1;
            if freq[evicted] == 0 {
                have -= 1;
            }
            left += 1;
        }

        if have == channels.len() {
            coincidences += 1;
            // Consume the leftmost event so the next coincidence cannot
            // reuse this window.
            let evicted = merged[left].channel;
            freq[evicted] -= 1;
            if freq[evicted] == 0 {
                have -= 1;
            }
            left += 1;
        }
    }

    Ok(coincidences)
}
