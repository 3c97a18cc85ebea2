//! Delay-scan driver.
//!
//! Reads singles from a CSV or binary file, sweeps the configured delay
//! range for every detector pair with data, and writes one CSV of
//! `delay_ns,count` rows per (pair, slice) under `Delay_Scan_Data/`.
//! Finishes with a singles-per-slice table on stdout.

use std::fs;
use std::path::Path;
use std::process;

use rayon::prelude::*;
use tracing::{error, info, warn};

use coinc_cli::{
    bridged_slice, clamp_slice_range, data_slice_range, logging, DriverError, ScanArgs, SCAN_PAIRS,
};
use coinc_core::delay_scan::DelayScanner;
use coinc_core::io::{read_file_auto, write_scan_csv, IngestOptions};
use coinc_core::singles::SinglesMap;

const OUTPUT_DIR: &str = "Delay_Scan_Data";

fn usage(exe: &str) {
    eprintln!(
        "Usage: {exe} <csv|bin> <coinc_window_ps> <delay_start_ns> <delay_end_ns> \
         <delay_step_ns> <start_slice> <stop_slice>"
    );
}

fn main() {
    logging::init();
    let args: Vec<String> = std::env::args().collect();
    let exe = args.first().map(String::as_str).unwrap_or("coinc-finder");

    let parsed = match ScanArgs::parse(&args[1..]) {
        Ok(parsed) => parsed,
        Err(err) => {
            eprintln!("{err}");
            usage(exe);
            process::exit(1);
        }
    };
    if let Err(err) = run(&parsed) {
        error!("{err}");
        process::exit(1);
    }
}

fn run(args: &ScanArgs) -> Result<(), DriverError> {
    info!(file = %args.file.display(), "reading singles");
    let ingested = read_file_auto(&args.file, &IngestOptions::default())?;
    info!(duration_secs = ingested.duration_secs, "ingestion finished");

    let data = data_slice_range(&ingested.channels)
        .ok_or_else(|| DriverError::Data("no singles data found".into()))?;
    let range = clamp_slice_range((args.start_slice, args.stop_slice), data).ok_or_else(|| {
        DriverError::Data(format!(
            "requested slice range has no overlap with data (available: {}-{})",
            data.0, data.1
        ))
    })?;

    fs::create_dir_all(OUTPUT_DIR)?;

    let active: Vec<_> = SCAN_PAIRS
        .iter()
        .copied()
        .filter(|&(ch1, ch2)| {
            let present =
                ingested.channels.contains_key(&ch1) && ingested.channels.contains_key(&ch2);
            if !present {
                info!(ch1, ch2, "skipping pair without singles");
            }
            present
        })
        .collect();
    if active.is_empty() {
        return Err(DriverError::Data(
            "no coincidence pairs have data in the provided file".into(),
        ));
    }

    let grid = args.delay_grid();
    active.par_iter().for_each(|&(ch1, ch2)| {
        let singles1 = &ingested.channels[&ch1];
        let singles2 = &ingested.channels[&ch2];
        let mut scanner = DelayScanner::new();
        let mut results = Vec::new();
        let mut scratch = Vec::new();
        let mut files_written = 0usize;

        for slice in range.0..=range.1 {
            let events1 = singles1.events_for_slice(slice);
            if events1.is_empty() {
                continue;
            }
            // Bridge the second channel so pairs straddling the slice
            // boundary still count.
            let span2 = bridged_slice(singles2, slice, args.window_ps, &mut scratch);
            if span2.is_empty() {
                continue;
            }

            if let Err(err) = scanner.scan_into(events1, span2, args.window_ps, grid, &mut results)
            {
                warn!(ch1, ch2, slice, "scan failed: {err}");
                continue;
            }
            let out_path = Path::new(OUTPUT_DIR)
                .join(format!("delay_scan_{ch1}_vs_{ch2}_second_{slice}.csv"));
            match write_scan_csv(&out_path, &results) {
                Ok(()) => files_written += 1,
                Err(err) => warn!(ch1, ch2, slice, "skipping {}: {err}", out_path.display()),
            }
        }
        info!(ch1, ch2, files_written, "pair finished");
    });

    print_singles_table(&ingested.channels, data);
    Ok(())
}

/// Per-slice singles counts for channels 1..=8, tab separated.
fn print_singles_table(channels: &SinglesMap, (first, last): (i64, i64)) {
    println!();
    println!("Singles per slice:");
    print!("Slice");
    for ch in 1..=8u8 {
        print!("\tch{ch}");
    }
    println!();
    for slice in first..=last {
        print!("{slice}");
        for ch in 1..=8u8 {
            let count = channels
                .get(&ch)
                .map_or(0, |singles| singles.events_for_slice(slice).len());
            print!("\t{count}");
        }
        println!();
    }
}
