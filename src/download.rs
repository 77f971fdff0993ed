//! Download and transcode of accepted matches.
//!
//! Wholly delegated to yt-dlp (which drives ffmpeg for the MP3 conversion).
//! The contract here is the discipline around the tool: a cheap existence
//! probe before committing to a transfer, a deterministic destination path,
//! and no partial or corrupt file left behind when anything fails.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::context::AUDIO_BITRATE_KBPS;
use crate::error::StageError;
use crate::models::TrackRecord;
use crate::normalize::sanitize_file_stem;

pub trait MediaDownloader {
    /// Cheap existence check: confirm the video id resolves to a playable
    /// resource without transferring media.
    fn probe(&self, video_id: &str) -> Result<(), StageError>;

    /// Retrieve the media and produce an MP3 at `dest`. On failure no file
    /// may remain at `dest`.
    fn fetch(&self, video_id: &str, dest: &Path) -> Result<(), StageError>;
}

/// Destination path for a record: `<output_dir>/<sanitized artist - title>.mp3`.
/// Deterministic for identical artist/title.
pub fn destination_path(output_dir: &Path, record: &TrackRecord) -> PathBuf {
    output_dir.join(format!(
        "{}.mp3",
        sanitize_file_stem(&record.artist, &record.title)
    ))
}

fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

// ============================================================================
// yt-dlp Implementation
// ============================================================================

pub struct YtDlpDownloader {
    bitrate_kbps: u32,
}

impl YtDlpDownloader {
    pub fn new() -> Self {
        Self {
            bitrate_kbps: AUDIO_BITRATE_KBPS,
        }
    }
}

impl Default for YtDlpDownloader {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaDownloader for YtDlpDownloader {
    fn probe(&self, video_id: &str) -> Result<(), StageError> {
        let output = Command::new("yt-dlp")
            .arg("--simulate")
            .arg("--quiet")
            .arg(watch_url(video_id))
            .stdin(Stdio::null())
            .output()
            .map_err(map_spawn_error)?;

        if output.status.success() {
            Ok(())
        } else {
            Err(StageError::Download(format!(
                "video {} is not reachable: {}",
                video_id,
                String::from_utf8_lossy(&output.stderr).trim()
            )))
        }
    }

    fn fetch(&self, video_id: &str, dest: &Path) -> Result<(), StageError> {
        // yt-dlp appends the final extension itself; hand it the stem
        let template = dest.with_extension("%(ext)s");
        let output = Command::new("yt-dlp")
            .arg("--format")
            .arg("bestaudio/best")
            .arg("-x")
            .arg("--audio-format")
            .arg("mp3")
            .arg("--audio-quality")
            .arg(format!("{}K", self.bitrate_kbps))
            .arg("--no-playlist")
            .arg("-o")
            .arg(&template)
            .arg(watch_url(video_id))
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                cleanup_partial(dest);
                map_spawn_error(e)
            })?;

        if !output.status.success() {
            cleanup_partial(dest);
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_failure(stderr.trim()));
        }

        if !dest.exists() {
            cleanup_partial(dest);
            return Err(StageError::Transcode(format!(
                "yt-dlp reported success but {} was not produced",
                dest.display()
            )));
        }
        Ok(())
    }
}

/// A failure in the ffmpeg post-processing step is a transcode error; any
/// other subprocess failure is a download error.
fn classify_failure(stderr: &str) -> StageError {
    let lowered = stderr.to_lowercase();
    if lowered.contains("postprocess") || lowered.contains("ffmpeg") {
        StageError::Transcode(stderr.to_string())
    } else {
        StageError::Download(stderr.to_string())
    }
}

/// Remove anything a failed run may have left at the destination: the
/// target file, yt-dlp's `.part` files, and un-transcoded audio containers
/// sharing the stem.
fn cleanup_partial(dest: &Path) {
    let mut leftovers = vec![dest.to_path_buf()];
    if let Some(name) = dest.file_name().and_then(|n| n.to_str()) {
        if let Some(parent) = dest.parent() {
            leftovers.push(parent.join(format!("{}.part", name)));
        }
    }
    for ext in ["webm", "m4a", "opus"] {
        leftovers.push(dest.with_extension(ext));
        if let Some(name) = dest.with_extension(ext).file_name().and_then(|n| n.to_str()) {
            if let Some(parent) = dest.parent() {
                leftovers.push(parent.join(format!("{}.part", name)));
            }
        }
    }
    for path in leftovers {
        let _ = std::fs::remove_file(path);
    }
}

fn map_spawn_error(err: std::io::Error) -> StageError {
    if err.kind() == ErrorKind::NotFound {
        StageError::Download("yt-dlp not found in PATH".to_string())
    } else {
        StageError::Download(format!("failed to run yt-dlp: {}", err))
    }
}

// ============================================================================
// Test Stub
// ============================================================================

#[cfg(test)]
pub mod stub {
    use super::*;
    use std::cell::RefCell;

    /// Canned downloader: records calls, optionally fails a named video id,
    /// writes a marker file for successes so destination handling is real.
    pub struct DownloaderStub {
        pub fail_id: Option<String>,
        pub fetched: RefCell<Vec<(String, PathBuf)>>,
    }

    impl DownloaderStub {
        pub fn ok() -> Self {
            Self {
                fail_id: None,
                fetched: RefCell::new(Vec::new()),
            }
        }

        pub fn failing(video_id: &str) -> Self {
            Self {
                fail_id: Some(video_id.to_string()),
                fetched: RefCell::new(Vec::new()),
            }
        }
    }

    impl MediaDownloader for DownloaderStub {
        fn probe(&self, video_id: &str) -> Result<(), StageError> {
            if self.fail_id.as_deref() == Some(video_id) {
                Err(StageError::Download(format!("{} unavailable", video_id)))
            } else {
                Ok(())
            }
        }

        fn fetch(&self, video_id: &str, dest: &Path) -> Result<(), StageError> {
            if self.fail_id.as_deref() == Some(video_id) {
                return Err(StageError::Download(format!("{} unavailable", video_id)));
            }
            std::fs::write(dest, b"mp3")?;
            self.fetched
                .borrow_mut()
                .push((video_id.to_string(), dest.to_path_buf()));
            Ok(())
        }
    }
}
