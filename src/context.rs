//! Shared pipeline context.
//!
//! Process-wide state (HTTP session, conventional paths, tuning constants)
//! is carried in one explicitly constructed value and passed down, never
//! held in module-level singletons.

use anyhow::{Context as _, Result};
use reqwest::blocking::Client;
use std::path::PathBuf;
use std::time::Duration;

/// Maximum absolute duration difference (seconds) for a candidate to be
/// accepted. Inclusive boundary: a candidate at exactly +/-5s matches.
pub const DURATION_TOLERANCE_SECS: u32 = 5;

/// Number of search results requested per track, in provider relevance order.
pub const SEARCH_LIMIT: usize = 5;

/// Fixed MP3 encoding rate for downloaded audio.
pub const AUDIO_BITRATE_KBPS: u32 = 192;

/// Pause between network fetches so source sites are not hammered.
pub const FETCH_DELAY: Duration = Duration::from_secs(1);

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Conventional file locations. Every stage reads and writes these by
/// default; binaries expose them as overridable clap args.
#[derive(Clone, Debug)]
pub struct PipelinePaths {
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl PipelinePaths {
    pub fn new(data_dir: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            data_dir,
            output_dir,
        }
    }

    pub fn tracklist(&self) -> PathBuf {
        self.data_dir.join("tracklist.txt")
    }

    pub fn spotify_csv(&self) -> PathBuf {
        self.data_dir.join("spotify_tracks.csv")
    }

    pub fn extracted_json(&self) -> PathBuf {
        self.data_dir.join("extracted_tracks.json")
    }

    pub fn extracted_csv(&self) -> PathBuf {
        self.data_dir.join("extracted_tracks.csv")
    }

    pub fn resolved_json(&self) -> PathBuf {
        self.data_dir.join("resolved_tracks.json")
    }

    pub fn downloaded_json(&self) -> PathBuf {
        self.data_dir.join("downloaded_tracks.json")
    }
}

impl Default for PipelinePaths {
    fn default() -> Self {
        Self::new(PathBuf::from("data"), PathBuf::from("output"))
    }
}

/// Explicitly constructed process context: one HTTP session shared by all
/// fetches plus the conventional paths. Constructing it creates the data
/// and output directories, so a run fails up front if they are unwritable.
pub struct PipelineContext {
    pub http: Client,
    pub paths: PipelinePaths,
}

impl PipelineContext {
    pub fn new(paths: PipelinePaths) -> Result<Self> {
        std::fs::create_dir_all(&paths.data_dir).with_context(|| {
            format!("failed to create data directory {}", paths.data_dir.display())
        })?;
        std::fs::create_dir_all(&paths.output_dir).with_context(|| {
            format!(
                "failed to create output directory {}",
                paths.output_dir.display()
            )
        })?;

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(15))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self { http, paths })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conventional_paths() {
        let paths = PipelinePaths::default();
        assert_eq!(paths.tracklist(), PathBuf::from("data/tracklist.txt"));
        assert_eq!(
            paths.resolved_json(),
            PathBuf::from("data/resolved_tracks.json")
        );
    }

    #[test]
    fn test_context_creates_directories() {
        let base = std::env::temp_dir().join(format!("trackpipe-ctx-{}", std::process::id()));
        let paths = PipelinePaths::new(base.join("data"), base.join("output"));
        let ctx = PipelineContext::new(paths).unwrap();
        assert!(ctx.paths.data_dir.is_dir());
        assert!(ctx.paths.output_dir.is_dir());
        std::fs::remove_dir_all(&base).unwrap();
    }
}
