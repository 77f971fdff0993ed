//! Core data models for the track pipeline.
//!
//! This module contains the track record tracked through every stage,
//! the ephemeral search candidate, and the per-batch summary counters.

use serde::{Deserialize, Serialize};

use crate::error::StageError;

// ============================================================================
// Track Lifecycle
// ============================================================================

/// Lifecycle status of a track record. Transitions are strictly forward:
/// `Pending -> Matched -> Downloaded`, or `-> Failed` from any earlier state.
/// `Failed` and `Downloaded` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackStatus {
    Pending,
    Matched,
    Downloaded,
    Failed,
}

/// One track as it moves through the pipeline. Persisted in full at every
/// stage boundary; the `matched_*` fields are diagnostic context for a human
/// auditing why a given video was accepted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrackRecord {
    pub title: String,
    #[serde(default)]
    pub artist: String,
    pub duration_seconds: Option<u32>,
    pub source_url: String,
    #[serde(default = "TrackStatus::pending")]
    pub status: TrackStatus,
    #[serde(default)]
    pub matched_video_id: Option<String>,
    #[serde(default)]
    pub failure_reason: Option<String>,

    // Match diagnostics, filled by the resolver on success
    #[serde(default)]
    pub matched_title: Option<String>,
    #[serde(default)]
    pub matched_duration_seconds: Option<u32>,
    #[serde(default)]
    pub matched_channel: Option<String>,
    #[serde(default)]
    pub duration_difference: Option<u32>,
    #[serde(default)]
    pub search_query: Option<String>,
}

impl TrackStatus {
    fn pending() -> Self {
        TrackStatus::Pending
    }
}

impl TrackRecord {
    pub fn new(
        title: String,
        artist: String,
        duration_seconds: Option<u32>,
        source_url: String,
    ) -> Self {
        Self {
            title,
            artist,
            duration_seconds,
            source_url,
            status: TrackStatus::Pending,
            matched_video_id: None,
            failure_reason: None,
            matched_title: None,
            matched_duration_seconds: None,
            matched_channel: None,
            duration_difference: None,
            search_query: None,
        }
    }

    /// Display identity for progress lines and failure reports.
    pub fn identity(&self) -> String {
        if self.artist.is_empty() {
            self.title.clone()
        } else {
            format!("{} - {}", self.artist, self.title)
        }
    }

    /// Record an accepted match. Only valid from `Pending`; the status and
    /// `matched_video_id` invariant is owned here.
    pub fn mark_matched(&mut self, candidate: &Candidate, query: &str) {
        debug_assert_eq!(self.status, TrackStatus::Pending);
        self.status = TrackStatus::Matched;
        self.matched_video_id = Some(candidate.video_id.clone());
        self.matched_title = Some(candidate.title.clone());
        self.matched_duration_seconds = candidate.duration_seconds;
        self.matched_channel = candidate.channel.clone();
        self.duration_difference = match (self.duration_seconds, candidate.duration_seconds) {
            (Some(want), Some(got)) => Some(want.abs_diff(got)),
            _ => None,
        };
        self.search_query = Some(query.to_string());
        self.failure_reason = None;
    }

    /// Record a completed download. Only valid from `Matched`; a record
    /// never regresses out of `Downloaded`.
    pub fn mark_downloaded(&mut self) {
        debug_assert_eq!(self.status, TrackStatus::Matched);
        self.status = TrackStatus::Downloaded;
        self.failure_reason = None;
    }

    /// Record a terminal failure. `failure_reason` is set iff the record is
    /// failed; any match accepted earlier is cleared so the
    /// matched-iff-video-id invariant holds.
    pub fn mark_failed(&mut self, err: &StageError) {
        debug_assert_ne!(self.status, TrackStatus::Downloaded);
        self.status = TrackStatus::Failed;
        self.failure_reason = Some(err.to_string());
        self.matched_video_id = None;
    }
}

// ============================================================================
// Search Candidates
// ============================================================================

/// One video search result, considered for matching against a track record.
/// Ephemeral: produced and consumed within a single resolver invocation.
#[derive(Clone, Debug)]
pub struct Candidate {
    pub video_id: String,
    pub title: String,
    pub duration_seconds: Option<u32>,
    pub channel: Option<String>,
}

// ============================================================================
// Batch Summary
// ============================================================================

/// Aggregate counters for one stage run, owned and mutated only by the
/// batch runner.
#[derive(Debug, Default, Clone, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub advanced: usize,
    pub failed: usize,
    /// Records whose status made the stage a no-op (already advanced or
    /// already failed). This is what makes re-running a stage idempotent.
    pub skipped: usize,
    /// (record identity, failure reason) for the final report block.
    pub failures: Vec<(String, String)>,
}

impl BatchSummary {
    pub fn record_advanced(&mut self) {
        self.total += 1;
        self.advanced += 1;
    }

    pub fn record_failed(&mut self, identity: String, reason: String) {
        self.total += 1;
        self.failed += 1;
        self.failures.push((identity, reason));
    }

    pub fn record_skipped(&mut self) {
        self.total += 1;
        self.skipped += 1;
    }

    /// Print the final summary block for a stage.
    pub fn report(&self, stage: &str, advanced_label: &str) {
        println!();
        println!("{:=<60}", "");
        println!("{} summary", stage);
        println!("{:=<60}", "");
        println!("  Total records: {}", self.total);
        println!("  {}: {}", advanced_label, self.advanced);
        println!("  Skipped (already processed): {}", self.skipped);
        println!("  Failed: {}", self.failed);
        if !self.failures.is_empty() {
            println!();
            println!("Failures:");
            for (identity, reason) in &self.failures {
                println!("  {} -> {}", identity, reason);
            }
        }
        println!("{:=<60}", "");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> TrackRecord {
        TrackRecord::new(
            "Example".to_string(),
            "Artist".to_string(),
            Some(200),
            "http://x".to_string(),
        )
    }

    fn candidate(id: &str, duration: Option<u32>) -> Candidate {
        Candidate {
            video_id: id.to_string(),
            title: format!("video {}", id),
            duration_seconds: duration,
            channel: Some("channel".to_string()),
        }
    }

    #[test]
    fn test_mark_matched_sets_video_id_and_diagnostics() {
        let mut rec = record();
        rec.mark_matched(&candidate("b", Some(203)), "Artist Example");
        assert_eq!(rec.status, TrackStatus::Matched);
        assert_eq!(rec.matched_video_id.as_deref(), Some("b"));
        assert_eq!(rec.duration_difference, Some(3));
        assert_eq!(rec.search_query.as_deref(), Some("Artist Example"));
        assert!(rec.failure_reason.is_none());
    }

    #[test]
    fn test_mark_failed_clears_match() {
        let mut rec = record();
        rec.mark_matched(&candidate("b", Some(203)), "q");
        rec.mark_failed(&StageError::Download("network gone".to_string()));
        assert_eq!(rec.status, TrackStatus::Failed);
        assert!(rec.matched_video_id.is_none());
        assert!(rec
            .failure_reason
            .as_deref()
            .unwrap()
            .contains("network gone"));
    }

    #[test]
    fn test_identity_falls_back_to_title() {
        let mut rec = record();
        rec.artist.clear();
        assert_eq!(rec.identity(), "Example");
        assert_eq!(record().identity(), "Artist - Example");
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&TrackStatus::Downloaded).unwrap();
        assert_eq!(json, "\"downloaded\"");
    }

    #[test]
    fn test_record_roundtrip_defaults_missing_fields() {
        // A minimal record (e.g. hand-edited checkpoint) still deserializes
        let json = r#"{"title":"T","duration_seconds":null,"source_url":"http://x"}"#;
        let rec: TrackRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.status, TrackStatus::Pending);
        assert!(rec.artist.is_empty());
        assert!(rec.matched_video_id.is_none());
    }
}
