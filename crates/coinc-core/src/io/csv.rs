//! CSV singles reader.
//!
//! One event per line, `timestamp_ps,channel[,...]`; anything after the
//! second field is ignored. Empty and malformed lines are skipped so a
//! truncated acquisition still loads.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::debug;

use super::{IngestOptions, IngestedSingles, SinglesBuilder};
use crate::types::{CoincError, CoincResult};

/// Parse a CSV event list into per-channel singles.
pub fn read_csv_singles(path: &Path, options: &IngestOptions) -> CoincResult<IngestedSingles> {
    let file = File::open(path).map_err(|source| CoincError::FileOpen {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);

    let mut builder = SinglesBuilder::new(options);
    let mut malformed = 0u64;
    for line in reader.lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let mut fields = line.splitn(3, ',');
        let ts_token = fields.next().unwrap_or("");
        let Some(ch_token) = fields.next() else {
            malformed += 1;
            continue;
        };
        let (Ok(ts), Ok(channel)) = (
            ts_token.trim().parse::<i64>(),
            ch_token.trim().parse::<u16>(),
        ) else {
            malformed += 1;
            continue;
        };
        builder.record(ts, channel);
    }
    if malformed > 0 {
        debug!(malformed, path = %path.display(), "skipped unparsable CSV lines");
    }
    Ok(builder.finish())
}
