use anyhow::Context;
use clap::Parser;
use curve_counter::{BoundaryConfig, CountingSession, Detection, Frame, SessionConfig};
use log::warn;

use std::io::BufRead;
use std::path::PathBuf;

/// Replays tracker output against a counting curve and reports IN/OUT totals.
#[derive(Debug, Parser)]
#[command(version)]
struct Opts {
    /// Boundary config (JSON with `curve_points` and `IN_direction`)
    #[arg(short, long)]
    boundary: PathBuf,

    /// Detections file, one `<frame_index>:<json array>` line per frame
    #[arg(short, long)]
    detections: PathBuf,

    /// Session thresholds (JSON); defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long, default_value_t = 1020)]
    width: u32,

    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Process every n-th frame only
    #[arg(short, long, default_value_t = 1)]
    skip: u64,

    /// Write calibration results and the inside region back into the boundary file
    #[arg(long)]
    save: bool,
}

fn parse_line(line: &str) -> Option<(u64, Vec<Detection>)> {
    let idx = match line.find(':') {
        Some(idx) => idx,
        None => {
            warn!("wrong file format: expected `:`");
            return None;
        }
    };

    let (index, vector) = line.split_at(idx);
    match (index.trim().parse::<u64>(), serde_json::from_str(&vector[1..])) {
        (Ok(index), Ok(dets)) => Some((index, dets)),
        (Ok(_), Err(err)) => {
            warn!("wrong file format: parse json failed: {}", err);
            None
        }
        (Err(_), _) => {
            warn!("wrong file format: parse frame index failed");
            None
        }
    }
}

fn main() -> Result<(), anyhow::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let opts = Opts::parse();

    let mut boundary = BoundaryConfig::load(&opts.boundary)
        .with_context(|| format!("loading boundary {}", opts.boundary.display()))?;

    let config = match &opts.config {
        Some(path) => {
            let data = std::fs::read_to_string(path)
                .with_context(|| format!("reading session config {}", path.display()))?;
            serde_json::from_str::<SessionConfig>(&data)?
        }
        None => SessionConfig::default(),
    };

    let mut session = CountingSession::from_boundary(&boundary, config)?;

    let dets_file = std::fs::File::open(&opts.detections)
        .with_context(|| format!("opening detections {}", opts.detections.display()))?;

    let skip = opts.skip.max(1);

    for line in std::io::BufReader::new(dets_file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let (index, detections) = match parse_line(&line) {
            Some(x) => x,
            None => continue,
        };

        if index % skip != 0 {
            continue;
        }

        let frame = Frame::new(index, (opts.width, opts.height), detections);
        let report = session.process_frame(&frame)?;

        for event in &report.events {
            println!(
                "{} {} {:?} {:.1} {:.1}",
                event.frame_index, event.track_id, event.direction, event.anchor.x, event.anchor.y
            );
        }
    }

    let totals = session.totals();
    println!("IN: {}", totals.in_count);
    println!("OUT: {}", totals.out_count);

    if opts.save {
        if let (Some(result), Some(diag)) = (session.orientation(), session.diagnostics()) {
            boundary.record_calibration(result, diag);
        }

        if let Some(region) = session.inside_region() {
            boundary.record_region(region);
        }

        boundary.save(&opts.boundary)?;
    }

    Ok(())
}
