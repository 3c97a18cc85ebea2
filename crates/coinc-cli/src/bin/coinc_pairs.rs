//! Peak-and-report driver.
//!
//! Finds the peak delay for each same-axis detector pair at the first
//! in-range slice, reuses those delays for the matching cross-axis pairs,
//! and writes per-slice coincidence counts as
//! `second,pair,delay_ns,coincidences` rows. With `--dump-events` the
//! individual matched timetag pairs go to `CoincEvents/<pair>.csv`.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

use tracing::{error, info};

use coinc_cli::{
    bridged_slice, clamp_slice_range, data_slice_range, logging, DriverError, PairSpec, ScanArgs,
    CROSS_PAIRS, SAME_PAIRS,
};
use coinc_core::delay_scan::DelayScanner;
use coinc_core::io::{read_file_auto, IngestOptions};
use coinc_core::pair_sweep::{collect_pairs_at_delay, count_pairs_at_delay};
use coinc_core::types::{CoincError, Timestamp};

const DEFAULT_REPORT: &str = "coincidences_report.csv";
const EVENTS_DIR: &str = "CoincEvents";

struct PairsArgs {
    scan: ScanArgs,
    output_csv: PathBuf,
    dump_events: bool,
}

fn parse_args(args: &[String]) -> Result<PairsArgs, DriverError> {
    let scan = ScanArgs::parse(args)?;
    let mut output_csv = PathBuf::from(DEFAULT_REPORT);
    let mut dump_events = false;
    for extra in &args[7..] {
        if extra == "--dump-events" {
            dump_events = true;
        } else {
            output_csv = PathBuf::from(extra);
        }
    }
    Ok(PairsArgs {
        scan,
        output_csv,
        dump_events,
    })
}

fn usage(exe: &str) {
    eprintln!("{exe} - fixed-delay coincidence counter (optional timetags)");
    eprintln!(
        "Usage: {exe} <csv|bin> <coinc_window_ps> <delay_start_ns> <delay_end_ns> \
         <delay_step_ns> <start_slice> <stop_slice> [output_csv] [--dump-events]"
    );
    eprintln!("Examples:");
    eprintln!("  {exe} data.bin 250 8 12 0.01 0 600");
    eprintln!("  {exe} data.bin 250 8 12 0.01 0 600 report.csv --dump-events");
    eprintln!();
    eprintln!("Behavior:");
    eprintln!("  - Finds peak delays for same-axis pairs (HH, VV, DD, AA) at the first");
    eprintln!("    in-range slice, reuses them for cross pairs (HV, VH, DA, AD).");
    eprintln!("  - Writes per-slice counts to output_csv (default {DEFAULT_REPORT}).");
    eprintln!("  - With --dump-events, writes {EVENTS_DIR}/<pair>.csv with raw timetag pairs.");
    eprintln!("Notes:");
    eprintln!("  - start_slice/stop_slice are clamped to the available data range.");
    eprintln!("  - delay_* in nanoseconds; window in picoseconds.");
}

fn main() {
    logging::init();
    let args: Vec<String> = std::env::args().collect();
    let exe = args.first().map(String::as_str).unwrap_or("coinc-pairs");

    let parsed = match parse_args(&args[1..]) {
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

fn run(args: &PairsArgs) -> Result<(), DriverError> {
    let scan = &args.scan;
    info!(file = %scan.file.display(), "reading singles");
    let ingested = read_file_auto(&scan.file, &IngestOptions::default())?;

    let data = data_slice_range(&ingested.channels)
        .ok_or_else(|| DriverError::Data("no singles data found".into()))?;
    let range = clamp_slice_range((scan.start_slice, scan.stop_slice), data).ok_or_else(|| {
        DriverError::Data(format!(
            "requested slice range has no overlap with data (available: {}-{})",
            data.0, data.1
        ))
    })?;

    let present = |spec: &&PairSpec| {
        ingested.channels.contains_key(&spec.ch1) && ingested.channels.contains_key(&spec.ch2)
    };
    let same: Vec<PairSpec> = SAME_PAIRS.iter().filter(present).copied().collect();
    let cross: Vec<PairSpec> = CROSS_PAIRS.iter().filter(present).copied().collect();
    if same.is_empty() {
        return Err(DriverError::Data(
            "no same-axis pairs present in the data".into(),
        ));
    }

    // Peak delays from the first in-range slice, one per same-axis pair.
    let grid = scan.delay_grid();
    let mut scanner = DelayScanner::new();
    let mut scan_results = Vec::new();
    let mut scratch1 = Vec::new();
    let mut scratch2 = Vec::new();
    let mut delays: BTreeMap<&'static str, Timestamp> = BTreeMap::new();
    for spec in &same {
        let singles1 = &ingested.channels[&spec.ch1];
        let singles2 = &ingested.channels[&spec.ch2];
        let span1 = bridged_slice(singles1, range.0, scan.window_ps, &mut scratch1);
        let span2 = bridged_slice(singles2, range.0, scan.window_ps, &mut scratch2);
        if span1.is_empty() || span2.is_empty() {
            continue;
        }
        let delay_ps =
            scanner.best_delay_ps(span1, span2, scan.window_ps, grid, &mut scan_results)?;
        println!("Delay {}: {} ns", spec.label, delay_ps as f64 / 1_000.0);
        delays.insert(spec.label, delay_ps);
    }
    if delays.is_empty() {
        return Err(DriverError::Data("failed to determine any delays".into()));
    }

    let report_file = File::create(&args.output_csv).map_err(|source| CoincError::FileOpen {
        path: args.output_csv.clone(),
        source,
    })?;
    let mut report = BufWriter::new(report_file);
    writeln!(report, "second,pair,delay_ns,coincidences")?;

    let mut event_streams: BTreeMap<&'static str, BufWriter<File>> = BTreeMap::new();
    if args.dump_events {
        fs::create_dir_all(EVENTS_DIR)?;
        for spec in same.iter().chain(&cross) {
            let path = Path::new(EVENTS_DIR).join(format!("{}.csv", spec.label));
            let file = File::create(&path)
                .map_err(|source| CoincError::FileOpen { path, source })?;
            let mut writer = BufWriter::new(file);
            writeln!(writer, "second,t1_ps,t2_ps")?;
            event_streams.insert(spec.label, writer);
        }
    }

    let all_pairs: Vec<PairSpec> = same.iter().chain(&cross).copied().collect();
    for slice in range.0..=range.1 {
        for spec in &all_pairs {
            let Some(&delay_ps) = delays.get(spec.delay_source) else {
                continue;
            };
            let singles1 = &ingested.channels[&spec.ch1];
            let singles2 = &ingested.channels[&spec.ch2];
            let span1 = bridged_slice(singles1, slice, scan.window_ps, &mut scratch1);
            let span2 = bridged_slice(singles2, slice, scan.window_ps, &mut scratch2);

            let count = count_pairs_at_delay(span1, span2, scan.window_ps, delay_ps);
            writeln!(
                report,
                "{},{},{},{}",
                slice,
                spec.label,
                delay_ps as f64 / 1_000.0,
                count
            )?;

            if let Some(writer) = event_streams.get_mut(spec.label) {
                for (t1, t2) in collect_pairs_at_delay(span1, span2, scan.window_ps, delay_ps) {
                    writeln!(writer, "{slice},{t1},{t2}")?;
                }
            }
        }
    }
    report.flush()?;
    for writer in event_streams.values_mut() {
        writer.flush()?;
    }

    println!("Wrote coincidence report to {}", args.output_csv.display());
    if args.dump_events {
        println!("Event CSVs written to {EVENTS_DIR}/*.csv");
    }
    Ok(())
}
