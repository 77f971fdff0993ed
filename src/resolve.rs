//! The resolver: match finding plus match verification for one record.
//!
//! Builds the deterministic search query, asks the search provider for the
//! top candidates, and accepts the first one within the duration tolerance.
//! On success the record advances to `matched` with full diagnostics; every
//! failure is returned to the runner, which decides what it means for the
//! batch.

use crate::context::{DURATION_TOLERANCE_SECS, SEARCH_LIMIT};
use crate::error::StageError;
use crate::models::TrackRecord;
use crate::normalize::build_search_query;
use crate::search::VideoSearch;
use crate::verify::select_match;

pub struct Resolver<'a, S: VideoSearch> {
    search: &'a S,
    tolerance: u32,
    limit: usize,
}

impl<'a, S: VideoSearch> Resolver<'a, S> {
    pub fn new(search: &'a S) -> Self {
        Self {
            search,
            tolerance: DURATION_TOLERANCE_SECS,
            limit: SEARCH_LIMIT,
        }
    }

    #[cfg(test)]
    pub fn with_tolerance(search: &'a S, tolerance: u32, limit: usize) -> Self {
        Self {
            search,
            tolerance,
            limit,
        }
    }

    /// Resolve one pending record in place. A record without an expected
    /// duration is rejected before any search call is spent on it.
    pub fn resolve(&self, record: &mut TrackRecord) -> Result<(), StageError> {
        if record.duration_seconds.is_none() {
            return Err(StageError::NoAcceptableMatch);
        }

        let query = build_search_query(&record.artist, &record.title);
        let candidates = self.search.search(&query, self.limit)?;
        let chosen = select_match(record.duration_seconds, &candidates, self.tolerance)?;

        record.mark_matched(chosen, &query);
        Ok(())
    }
}
