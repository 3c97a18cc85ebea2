//! Time-tagger binary singles reader.
//!
//! The dump format is a fixed 40-byte header followed by 10-byte records:
//! a `u64` little-endian picosecond timestamp and a `u16` little-endian
//! 0-based channel index. Channels are converted to the 1-based convention
//! used everywhere else; records with a zero timestamp or an out-of-range
//! channel are discarded. A trailing partial record is ignored.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use tracing::debug;

use super::{IngestOptions, IngestedSingles, SinglesBuilder};
use crate::types::{CoincError, CoincResult};

const HEADER_BYTES: usize = 40;
const RECORD_BYTES: usize = 10;

/// Parse a binary time-tagger dump into per-channel singles.
pub fn read_bin_singles(path: &Path, options: &IngestOptions) -> CoincResult<IngestedSingles> {
    let file = File::open(path).map_err(|source| CoincError::FileOpen {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = BufReader::new(file);
    let mut builder = SinglesBuilder::new(options);

    let mut header = [0u8; HEADER_BYTES];
    match reader.read_exact(&mut header) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => {
            debug!(path = %path.display(), "file shorter than header, no events");
            return Ok(builder.finish());
        }
        Err(err) => return Err(err.into()),
    }

    let mut record = [0u8; RECORD_BYTES];
    loop {
        match reader.read_exact(&mut record) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(err) => return Err(err.into()),
        }
        let ts = u64::from_le_bytes(record[0..8].try_into().unwrap()) as i64;
        let channel = u16::from_le_bytes(record[8..10].try_into().unwrap());
        builder.record(ts, channel.saturating_add(1));
    }

    Ok(builder.finish())
}
