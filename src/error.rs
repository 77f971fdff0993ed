//! Per-record error kinds for the pipeline.
//!
//! Every error a stage can hit for a single record is one of these variants;
//! the batch runner catches them at the record boundary and converts them
//! into `failed` status instead of aborting the batch. Only configuration
//! failures (missing input file, unwritable output directory) bypass this
//! type and abort the run via `anyhow` at the binary boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StageError {
    /// Source page unreachable, unparsable, or missing required fields.
    #[error("extraction failed: {0}")]
    Extraction(String),

    /// Video search call failed or returned zero results.
    #[error("search failed: {0}")]
    Search(String),

    /// No candidate within the duration tolerance. Expected and recoverable,
    /// not a system error.
    #[error("no duration match")]
    NoAcceptableMatch,

    #[error("download failed: {0}")]
    Download(String),

    #[error("transcode failed: {0}")]
    Transcode(String),

    #[error("filesystem error: {0}")]
    FileSystem(#[from] std::io::Error),
}

impl StageError {
    /// Stable short name for summary grouping and progress lines.
    pub fn kind(&self) -> &'static str {
        match self {
            StageError::Extraction(_) => "extraction",
            StageError::Search(_) => "search",
            StageError::NoAcceptableMatch => "no-match",
            StageError::Download(_) => "download",
            StageError::Transcode(_) => "transcode",
            StageError::FileSystem(_) => "filesystem",
        }
    }
}
