//! Stage 2: resolve each extracted track against video search.
//!
//! Loads the extraction checkpoint (or a Spotify CSV export for the
//! streaming-service path), runs the resolver per pending record, and
//! writes the full batch back out with match results. Already-matched and
//! already-failed records pass through untouched, so re-running the stage
//! is idempotent.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use trackpipe::context::FETCH_DELAY;
use trackpipe::models::TrackStatus;
use trackpipe::progress::set_log_only;
use trackpipe::resolve::Resolver;
use trackpipe::runner::run_stage;
use trackpipe::safety::validate_output_path;
use trackpipe::search::YtDlpSearch;
use trackpipe::store;

#[derive(Parser)]
#[command(name = "resolve-tracks")]
#[command(about = "Match extracted tracks to videos by search and duration")]
struct Args {
    /// Extraction checkpoint (.json), or a Spotify export (.csv)
    #[arg(long, default_value = "data/extracted_tracks.json")]
    input: PathBuf,

    /// Resolution checkpoint to write
    #[arg(long, default_value = "data/resolved_tracks.json")]
    output: PathBuf,

    /// Hide progress bars (tail-friendly output)
    #[arg(long)]
    log_only: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    set_log_only(args.log_only);

    validate_output_path(&args.output, "resolved", &[&args.input])?;

    let is_csv = args
        .input
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    let mut records = if is_csv {
        store::load_spotify_csv(&args.input)
    } else {
        store::load_records(&args.input)
    }
    .with_context(|| format!("cannot load tracks from {}", args.input.display()))?;
    println!("Processing {} tracks", records.len());

    let search = YtDlpSearch;
    let resolver = Resolver::new(&search);

    let summary = run_stage("resolve", &mut records, TrackStatus::Pending, |record| {
        let result = resolver.resolve(record);
        // Be polite to the search provider
        std::thread::sleep(FETCH_DELAY);
        result
    });

    store::save_records(&args.output, &records)?;
    println!("Checkpoint written to {}", args.output.display());

    summary.report("Resolution", "Matched");
    Ok(())
}
