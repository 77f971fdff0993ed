//! Video search.
//!
//! The search provider is behind a trait so the resolver and runner can be
//! exercised without network access. The real implementation shells out to
//! yt-dlp's `ytsearchN:` pseudo-URL and parses one JSON object per result
//! line, preserving the provider's relevance order.

use serde::Deserialize;
use std::io::ErrorKind;
use std::process::{Command, Stdio};

use crate::error::StageError;
use crate::models::Candidate;

pub trait VideoSearch {
    /// Return up to `limit` candidates in provider relevance order.
    /// Zero results is a `Search` error; the caller decides whether that is
    /// fatal for the record.
    fn search(&self, query: &str, limit: usize) -> Result<Vec<Candidate>, StageError>;
}

// ============================================================================
// yt-dlp Implementation
// ============================================================================

#[derive(Debug, Deserialize)]
struct SearchHit {
    id: String,
    title: String,
    duration: Option<f64>,
    uploader: Option<String>,
}

pub struct YtDlpSearch;

impl VideoSearch for YtDlpSearch {
    fn search(&self, query: &str, limit: usize) -> Result<Vec<Candidate>, StageError> {
        let search_url = format!("ytsearch{}:{}", limit, query);
        let output = Command::new("yt-dlp")
            .arg("--dump-json")
            .arg("--no-download")
            .arg("--quiet")
            .arg(&search_url)
            .stdin(Stdio::null())
            .output()
            .map_err(map_spawn_error)?;

        if !output.status.success() {
            return Err(StageError::Search(format!(
                "yt-dlp search for '{}' failed: {}",
                query,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        // One JSON object per line; skip lines that do not parse rather
        // than losing the whole result set.
        let stdout = String::from_utf8_lossy(&output.stdout);
        let candidates: Vec<Candidate> = stdout
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| serde_json::from_str::<SearchHit>(line).ok())
            .map(|hit| Candidate {
                video_id: hit.id,
                title: hit.title,
                duration_seconds: hit.duration.map(|d| d.round() as u32),
                channel: hit.uploader,
            })
            .collect();

        if candidates.is_empty() {
            return Err(StageError::Search(format!("no results for '{}'", query)));
        }
        Ok(candidates)
    }
}

fn map_spawn_error(err: std::io::Error) -> StageError {
    if err.kind() == ErrorKind::NotFound {
        StageError::Search("yt-dlp not found in PATH".to_string())
    } else {
        StageError::Search(format!("failed to run yt-dlp: {}", err))
    }
}

// ============================================================================
// Test Stub
// ============================================================================


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_hit_parses_yt_dlp_line() {
        let line = r#"{"id":"abc123","title":"Example Song","duration":203.4,"uploader":"SomeChannel","webpage_url":"https://youtube.com/watch?v=abc123"}"#;
        let hit: SearchHit = serde_json::from_str(line).unwrap();
        assert_eq!(hit.id, "abc123");
        assert_eq!(hit.duration, Some(203.4));
        assert_eq!(hit.uploader.as_deref(), Some("SomeChannel"));
    }

    #[test]
    fn test_search_hit_tolerates_missing_optionals() {
        let line = r#"{"id":"abc123","title":"Example Song"}"#;
        let hit: SearchHit = serde_json::from_str(line).unwrap();
        assert!(hit.duration.is_none());
        assert!(hit.uploader.is_none());
    }
}
