//! Marketplace page scraping.
//!
//! Pulls title, artist, and duration out of a track page. The markup is not
//! stable, so each field has a fallback ladder: a dedicated element first,
//! then looser page-level patterns. A page where even the fallbacks find no
//! title is an extraction failure for that one record.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::context::PipelineContext;
use crate::error::StageError;
use crate::models::TrackRecord;
use crate::normalize::{parse_duration, DURATION_TOKEN};

// ============================================================================
// Page Patterns
// ============================================================================

static H1_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<h1[^>]*>(.*?)</h1>").unwrap());

static TITLE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap());

/// Dedicated artists block on track pages.
static ARTISTS_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<p[^>]*class="[^"]*interior-track-artists[^"]*"[^>]*>(.*?)</p>"#).unwrap()
});

/// Fallback: anchor tags whose href points at an artist page.
static ARTIST_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<a[^>]*href="[^"]*/artist/[^"]*"[^>]*>(.*?)</a>"#).unwrap()
});

/// Dedicated track length block.
static LENGTH_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<p[^>]*class="[^"]*interior-track-length[^"]*"[^>]*>(.*?)</p>"#).unwrap()
});

static ANY_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]+>").unwrap());

static HTML_ENTITIES: &[(&str, &str)] = &[
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&#x27;", "'"),
    ("&nbsp;", " "),
];

fn strip_tags(html: &str) -> String {
    let text = ANY_TAG.replace_all(html, " ");
    let mut text = text.into_owned();
    for (entity, replacement) in HTML_ENTITIES {
        text = text.replace(entity, replacement);
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ============================================================================
// Field Extraction
// ============================================================================

fn extract_title(html: &str) -> Option<String> {
    if let Some(caps) = H1_TEXT.captures(html) {
        let title = strip_tags(&caps[1]);
        if !title.is_empty() {
            return Some(dedupe_feat(&title));
        }
    }

    // Fallback: "<artists> - <title> [label]" page title
    let caps = TITLE_TAG.captures(html)?;
    let page_title = strip_tags(&caps[1]);
    let after_dash = page_title.split(" - ").nth(1)?;
    let title = after_dash.split(" [").next()?.trim();
    (!title.is_empty()).then(|| title.to_string())
}

/// Pages sometimes render the feat. credit twice ("Song feat. X feat. X");
/// keep only the first occurrence.
fn dedupe_feat(title: &str) -> String {
    let parts: Vec<&str> = title.split("feat.").collect();
    if parts.len() > 2 {
        format!("{}feat.{}", parts[0], parts[1]).trim().to_string()
    } else {
        title.trim().to_string()
    }
}

fn extract_artist(html: &str) -> String {
    if let Some(caps) = ARTISTS_BLOCK.captures(html) {
        let block = &caps[1];
        let links: Vec<String> = ARTIST_LINK
            .captures_iter(block)
            .map(|c| strip_tags(&c[1]))
            .filter(|a| !a.is_empty())
            .collect();
        if !links.is_empty() {
            return links.join(", ");
        }
        let text = strip_tags(block);
        if !text.is_empty() {
            return text;
        }
    }

    // Fallback: first few artist links anywhere on the page
    let links: Vec<String> = ARTIST_LINK
        .captures_iter(html)
        .map(|c| strip_tags(&c[1]))
        .filter(|a| !a.is_empty())
        .take(3)
        .collect();
    links.join(", ")
}

fn extract_duration(html: &str) -> Option<u32> {
    if let Some(caps) = LENGTH_BLOCK.captures(html) {
        if let Some(secs) = parse_duration(&strip_tags(&caps[1])) {
            return Some(secs);
        }
    }
    // Fallback: first bare M:SS token in the page
    DURATION_TOKEN
        .find(html)
        .and_then(|m| parse_duration(m.as_str()))
}

// ============================================================================
// Extractor
// ============================================================================

/// Fetch a track page and extract one pending record from it.
pub fn extract_track(ctx: &PipelineContext, url: &str) -> Result<TrackRecord, StageError> {
    let response = ctx
        .http
        .get(url)
        .send()
        .and_then(|r| r.error_for_status())
        .map_err(|e| StageError::Extraction(format!("fetch {}: {}", url, e)))?;
    let html = response
        .text()
        .map_err(|e| StageError::Extraction(format!("read {}: {}", url, e)))?;

    parse_track_page(&html, url)
}

/// Parse the fetched page. Split from the fetch so tests can feed markup
/// directly.
pub fn parse_track_page(html: &str, url: &str) -> Result<TrackRecord, StageError> {
    let title = extract_title(html)
        .ok_or_else(|| StageError::Extraction(format!("no track title found at {}", url)))?;
    let artist = extract_artist(html);
    let duration_seconds = extract_duration(html);

    Ok(TrackRecord::new(
        title,
        artist,
        duration_seconds,
        url.to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><head><title>Artist One, Artist Two - Example Song [Label]</title></head>
        <body>
        <h1>Example Song</h1>
        <p class="interior-track-artists">
            <a href="/artist/one/1">Artist One</a>, <a href="/artist/two/2">Artist Two</a>
        </p>
        <p class="interior-track-length">6:30</p>
        </body></html>"#;

    #[test]
    fn test_parse_full_page() {
        let rec = parse_track_page(PAGE, "http://x").unwrap();
        assert_eq!(rec.title, "Example Song");
        assert_eq!(rec.artist, "Artist One, Artist Two");
        assert_eq!(rec.duration_seconds, Some(390));
        assert_eq!(rec.source_url, "http://x");
    }

    #[test]
    fn test_title_falls_back_to_title_tag() {
        let html = r#"<title>Artist - Fallback Song [Label]</title><p>3:10</p>"#;
        let rec = parse_track_page(html, "http://x").unwrap();
        assert_eq!(rec.title, "Fallback Song");
        assert_eq!(rec.duration_seconds, Some(190));
    }

    #[test]
    fn test_duration_falls_back_to_bare_token() {
        let html = "<h1>Song</h1>\nruntime 4:05 total";
        let rec = parse_track_page(html, "http://x").unwrap();
        assert_eq!(rec.duration_seconds, Some(245));
    }

    #[test]
    fn test_missing_title_is_extraction_error() {
        let err = parse_track_page("<p>nothing here</p>", "http://x").unwrap_err();
        assert_eq!(err.kind(), "extraction");
    }

    #[test]
    fn test_missing_duration_leaves_none() {
        let rec = parse_track_page("<h1>Song</h1>", "http://x").unwrap();
        assert_eq!(rec.duration_seconds, None);
    }

    #[test]
    fn test_dedupe_feat() {
        assert_eq!(
            dedupe_feat("Song feat. Guest feat. Guest"),
            "Song feat. Guest"
        );
        assert_eq!(dedupe_feat("Song feat. Guest"), "Song feat. Guest");
    }

    #[test]
    fn test_entities_decoded_in_title() {
        let html = "<h1>Rock &amp; Roll</h1>";
        let rec = parse_track_page(html, "http://x").unwrap();
        assert_eq!(rec.title, "Rock & Roll");
    }
}
