//! Rolling-window ingestion demo.
//!
//! Reads one singles file, feeds it to a rolling store as a single chunk and
//! prints the retained extent per channel.
//!
//! Run with: cargo run -p coinc-core --example rolling_window -- <csv|bin>

use std::process;

use coinc_core::io::{read_file_auto, IngestOptions};
use coinc_core::rolling::RollingSingles;

fn main() {
    let Some(path) = std::env::args().nth(1) else {
        eprintln!("Usage: rolling_window <csv_or_bin_file>");
        process::exit(1);
    };

    let ingested = match read_file_auto(path.as_ref(), &IngestOptions::default()) {
        Ok(ingested) => ingested,
        Err(err) => {
            eprintln!("{err}");
            process::exit(1);
        }
    };
    println!("Total measurement time {} s", ingested.duration_secs);

    let mut rolling = RollingSingles::new(400);
    rolling.append_chunk(&ingested.channels);

    for (channel, singles) in rolling.channels() {
        println!(
            "Channel {} base_slice={} buckets={} events={}",
            channel,
            singles.base_slice(),
            singles.num_slices(),
            singles.total_events()
        );
    }
}
