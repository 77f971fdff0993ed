//! Loading and saving of track record batches.
//!
//! Every stage reads its predecessor's full checkpoint file and writes a
//! full replacement including all records, successful and failed. The
//! checkpoint is the only durable state between stages; an interrupted run
//! resumes by re-invoking the stage against the same files.
//!
//! Inputs come in two shapes: a plain-text URL list for the marketplace
//! path, and a CSV export (title, artist, duration columns) for the
//! streaming-service path. Any load/save error here is a configuration
//! failure and aborts the run before records are processed.

use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::models::TrackRecord;
use crate::normalize::parse_duration;

// ============================================================================
// URL List Input
// ============================================================================

/// Read the marketplace URL list: one URL per line, blank lines skipped.
pub fn load_url_list(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read URL list {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

// ============================================================================
// Spotify CSV Input
// ============================================================================

/// Read a streaming-service CSV export into pending track records.
/// Required columns (case-insensitive header match): title, artist,
/// duration. A row with an unparsable duration still becomes a record;
/// verification fails it later rather than losing it here.
pub fn load_spotify_csv(path: &Path) -> Result<Vec<TrackRecord>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open CSV {}", path.display()))?;

    let headers = reader
        .headers()
        .context("failed to read CSV header")?
        .clone();
    let col = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    };
    let (title_col, duration_col) = match (col("title"), col("duration")) {
        (Some(t), Some(d)) => (t, d),
        _ => bail!(
            "CSV {} is missing a required column (need title, artist, duration)",
            path.display()
        ),
    };
    let artist_col = col("artist");

    let mut records = Vec::new();
    for (i, row) in reader.records().enumerate() {
        let row = row.with_context(|| format!("failed to read CSV row {}", i + 1))?;
        let title = row.get(title_col).unwrap_or("").trim().to_string();
        if title.is_empty() {
            continue;
        }
        let artist = artist_col
            .and_then(|c| row.get(c))
            .unwrap_or("")
            .trim()
            .to_string();
        let duration_seconds = row.get(duration_col).and_then(parse_duration);

        // CSV rows have no origin page; a synthetic row URL keeps
        // source_url unique within the batch.
        records.push(TrackRecord::new(
            title,
            artist,
            duration_seconds,
            format!("spotify:row:{}", i + 1),
        ));
    }
    Ok(records)
}

// ============================================================================
// JSON Checkpoints
// ============================================================================

/// Load a stage checkpoint: the full batch of track records.
pub fn load_records(path: &Path) -> Result<Vec<TrackRecord>> {
    let file = File::open(path)
        .with_context(|| format!("failed to open checkpoint {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse checkpoint {}", path.display()))
}

/// Write a stage checkpoint: full replacement of the batch.
pub fn save_records(path: &Path, records: &[TrackRecord]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create checkpoint {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), records)
        .with_context(|| format!("failed to write checkpoint {}", path.display()))
}

/// Mirror a batch to CSV for spreadsheet inspection. Same field set as the
/// JSON checkpoint; the JSON stays the canonical stage boundary.
pub fn save_records_csv(path: &Path, records: &[TrackRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create CSV {}", path.display()))?;
    for record in records {
        writer
            .serialize(record)
            .with_context(|| format!("failed to write CSV row for {}", record.identity()))?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to flush CSV {}", path.display()))
}
