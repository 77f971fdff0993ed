//! Normalization helpers shared by every stage.
//!
//! Duration strings from source pages and CSV exports come in `M:SS` or
//! `H:MM:SS` form; search queries must be byte-identical for identical
//! inputs; output filenames must be filesystem-safe on every platform.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Collapses runs of whitespace into single spaces.
static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());

/// Bare duration token as it appears in marketplace page text, e.g. "6:30".
pub static DURATION_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{1,2}:\d{2}\b").unwrap());

// ============================================================================
// Durations
// ============================================================================

/// Parse "M:SS" or "H:MM:SS" into total seconds. Returns None for anything
/// else, including a bare number (some exports store raw milliseconds there
/// and guessing would be worse than re-extracting).
pub fn parse_duration(text: &str) -> Option<u32> {
    let parts: Vec<&str> = text.trim().split(':').collect();
    match parts.as_slice() {
        [m, s] => {
            let minutes: u32 = m.parse().ok()?;
            let seconds: u32 = s.parse().ok()?;
            (seconds < 60).then_some(minutes * 60 + seconds)
        }
        [h, m, s] => {
            let hours: u32 = h.parse().ok()?;
            let minutes: u32 = m.parse().ok()?;
            let seconds: u32 = s.parse().ok()?;
            (minutes < 60 && seconds < 60).then_some(hours * 3600 + minutes * 60 + seconds)
        }
        _ => None,
    }
}

/// Format seconds back to "M:SS" for progress lines.
pub fn format_duration(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

// ============================================================================
// Search Queries
// ============================================================================

/// Deterministic search query for a track: `"artist title"`, collapsed
/// whitespace, title alone when the artist is empty. Identical inputs
/// always yield identical queries.
pub fn build_search_query(artist: &str, title: &str) -> String {
    let raw = if artist.trim().is_empty() {
        title.trim().to_string()
    } else {
        format!("{} {}", artist.trim(), title.trim())
    };
    MULTI_SPACE.replace_all(&raw, " ").into_owned()
}

// ============================================================================
// Output Filenames
// ============================================================================

fn is_combining_mark(c: char) -> bool {
    matches!(c, '\u{0300}'..='\u{036F}' | '\u{1AB0}'..='\u{1AFF}' |
             '\u{1DC0}'..='\u{1DFF}' | '\u{20D0}'..='\u{20FF}' |
             '\u{FE20}'..='\u{FE2F}')
}

/// NFKD-decompose and drop combining marks, so "Beyoncé" folds to "Beyonce".
fn fold_diacritics(s: &str) -> String {
    s.nfkd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Derive a filesystem-safe file stem for a track. Deterministic for
/// identical artist/title; diacritics folded, reserved characters replaced,
/// trailing dots trimmed (Windows rejects them).
pub fn sanitize_file_stem(artist: &str, title: &str) -> String {
    let raw = if artist.trim().is_empty() {
        title.trim().to_string()
    } else {
        format!("{} - {}", artist.trim(), title.trim())
    };

    let folded = fold_diacritics(&raw);
    let mut sanitized = String::with_capacity(folded.len());
    for ch in folded.chars() {
        match ch {
            '/' | '\\' | '?' | '*' | '"' | '<' | '>' | '|' | ':' => sanitized.push('_'),
            c if c.is_control() => sanitized.push('_'),
            _ => sanitized.push(ch),
        }
    }

    let collapsed = MULTI_SPACE.replace_all(&sanitized, " ");
    let trimmed = collapsed.trim().trim_matches('.');
    if trimmed.is_empty() {
        "track".to_string()
    } else {
        trimmed.to_string()
    }
}
