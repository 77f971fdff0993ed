//! Stage 1: scrape marketplace track pages into a batch of track records.
//!
//! Reads a URL list (one track page per line), fetches and parses each
//! page, and writes the full batch - including records whose extraction
//! failed - to the extraction checkpoint. A JSON checkpoint is the stage
//! boundary; a CSV mirror is written alongside for spreadsheet inspection.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use trackpipe::context::{PipelineContext, PipelinePaths, FETCH_DELAY};
use trackpipe::extract::extract_track;
use trackpipe::models::{BatchSummary, TrackRecord};
use trackpipe::progress::{create_progress_bar, set_log_only};
use trackpipe::safety::validate_output_path;
use trackpipe::store;

#[derive(Parser)]
#[command(name = "extract-tracks")]
#[command(about = "Scrape track metadata from marketplace pages into a checkpoint file")]
struct Args {
    /// URL list, one track page per line
    #[arg(long, default_value = "data/tracklist.txt")]
    input: PathBuf,

    /// Extraction checkpoint to write
    #[arg(long, default_value = "data/extracted_tracks.json")]
    output: PathBuf,

    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    #[arg(long, default_value = "output")]
    output_dir: PathBuf,

    /// Hide progress bars (tail-friendly output)
    #[arg(long)]
    log_only: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    set_log_only(args.log_only);

    let ctx = PipelineContext::new(PipelinePaths::new(args.data_dir, args.output_dir))?;
    validate_output_path(&args.output, "extracted", &[&args.input])?;

    let urls = store::load_url_list(&args.input)
        .with_context(|| format!("cannot read URL list {}", args.input.display()))?;
    println!("Found {} tracks to process", urls.len());

    let mut records: Vec<TrackRecord> = Vec::with_capacity(urls.len());
    let mut summary = BatchSummary::default();
    let pb = create_progress_bar(urls.len() as u64, "extract");

    for url in &urls {
        match extract_track(&ctx, url) {
            Ok(record) => {
                pb.println(format!("  ✓ {}", record.identity()));
                summary.record_advanced();
                records.push(record);
            }
            Err(err) => {
                pb.println(format!("  ✗ {} [{}]: {}", url, err.kind(), err));
                let mut record =
                    TrackRecord::new("Unknown".to_string(), String::new(), None, url.clone());
                record.mark_failed(&err);
                summary.record_failed(url.clone(), err.to_string());
                records.push(record);
            }
        }
        pb.inc(1);
        // Be polite to the source site
        std::thread::sleep(FETCH_DELAY);
    }
    pb.finish_with_message(format!(
        "extract: {} extracted, {} failed",
        summary.advanced, summary.failed
    ));

    store::save_records(&args.output, &records)?;
    store::save_records_csv(&ctx.paths.extracted_csv(), &records)?;
    println!("Checkpoint written to {}", args.output.display());

    summary.report("Extraction", "Extracted");
    Ok(())
}
