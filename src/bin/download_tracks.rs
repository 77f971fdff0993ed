//! Stage 3: download and transcode every matched track.
//!
//! Loads the resolution checkpoint, probes each matched video id, downloads
//! and converts it to MP3 in the output directory, and writes the batch
//! back out with final statuses. Records that are not `matched` (still
//! pending, already downloaded, or failed upstream) are skipped.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use trackpipe::context::{PipelineContext, PipelinePaths};
use trackpipe::download::{destination_path, MediaDownloader, YtDlpDownloader};
use trackpipe::error::StageError;
use trackpipe::models::TrackStatus;
use trackpipe::progress::set_log_only;
use trackpipe::runner::run_stage;
use trackpipe::safety::validate_output_path;
use trackpipe::store;

#[derive(Parser)]
#[command(name = "download-tracks")]
#[command(about = "Download matched tracks and transcode them to MP3")]
struct Args {
    /// Resolution checkpoint
    #[arg(long, default_value = "data/resolved_tracks.json")]
    input: PathBuf,

    /// Final checkpoint to write
    #[arg(long, default_value = "data/downloaded_tracks.json")]
    output: PathBuf,

    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Directory that receives one MP3 per downloaded record
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
    validate_output_path(&args.output, "downloaded", &[&args.input])?;

    let mut records = store::load_records(&args.input)
        .with_context(|| format!("cannot load tracks from {}", args.input.display()))?;
    let matched = records
        .iter()
        .filter(|r| r.status == TrackStatus::Matched)
        .count();
    println!(
        "Found {} matched tracks out of {} total",
        matched,
        records.len()
    );

    let downloader = YtDlpDownloader::new();

    let summary = run_stage("download", &mut records, TrackStatus::Matched, |record| {
        let video_id = record
            .matched_video_id
            .clone()
            .ok_or_else(|| StageError::Download("matched record has no video id".to_string()))?;
        downloader.probe(&video_id)?;
        downloader.fetch(&video_id, &destination_path(&ctx.paths.output_dir, record))?;
        record.mark_downloaded();
        Ok(())
    });

    store::save_records(&args.output, &records)?;
    println!("Checkpoint written to {}", args.output.display());
    println!("Audio files in {}", ctx.paths.output_dir.display());

    summary.report("Download", "Downloaded");
    Ok(())
}
