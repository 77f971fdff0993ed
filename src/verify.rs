//! Match verification.
//!
//! Strict first-match policy: scan candidates in provider relevance order
//! and accept the first one within the duration tolerance. Ties between
//! equally-close candidates are broken by relevance order, never by closest
//! duration.

use crate::error::StageError;
use crate::models::Candidate;

/// Select the first candidate whose duration is within `tolerance` seconds
/// of `expected` (boundary inclusive). A missing expected duration yields
/// `NoAcceptableMatch` immediately, without inspecting any candidate:
/// verification is undefined without a reference duration. Candidates
/// without a reported duration are never acceptable.
pub fn select_match<'a>(
    expected: Option<u32>,
    candidates: &'a [Candidate],
    tolerance: u32,
) -> Result<&'a Candidate, StageError> {
    let expected = expected.ok_or(StageError::NoAcceptableMatch)?;

    candidates
        .iter()
        .find(|c| {
            c.duration_seconds
                .is_some_and(|d| d.abs_diff(expected) <= tolerance)
        })
        .ok_or(StageError::NoAcceptableMatch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, duration: Option<u32>) -> Candidate {
        Candidate {
            video_id: id.to_string(),
            title: format!("video {}", id),
            duration_seconds: duration,
            channel: None,
        }
    }

    #[test]
    fn test_first_match_beats_closer_later_match() {
        // 200s target: "b" at 203 (diff 3) comes before "c" at 199 (diff 1).
        // Relevance order wins over closeness.
        let candidates = vec![
            candidate("a", Some(150)),
            candidate("b", Some(203)),
            candidate("c", Some(199)),
        ];
        let chosen = select_match(Some(200), &candidates, 5).unwrap();
        assert_eq!(chosen.video_id, "b");
    }

    #[test]
    fn test_single_in_tolerance_selected_at_any_rank() {
        for position in 0..3 {
            let mut candidates = vec![
                candidate("far1", Some(100)),
                candidate("far2", Some(300)),
            ];
            candidates.insert(position, candidate("hit", Some(202)));
            let chosen = select_match(Some(200), &candidates, 5).unwrap();
            assert_eq!(chosen.video_id, "hit", "position {}", position);
        }
    }

    #[test]
    fn test_tolerance_boundary_inclusive_at_5() {
        let exact = vec![candidate("edge", Some(205))];
        assert!(select_match(Some(200), &exact, 5).is_ok());
        let below = vec![candidate("edge", Some(195))];
        assert!(select_match(Some(200), &below, 5).is_ok());

        let over = vec![candidate("edge", Some(206))];
        assert!(matches!(
            select_match(Some(200), &over, 5),
            Err(StageError::NoAcceptableMatch)
        ));
        let under = vec![candidate("edge", Some(194))];
        assert!(select_match(Some(200), &under, 5).is_err());
    }

    #[test]
    fn test_missing_expected_duration_short_circuits() {
        // Candidates are not inspected: even an exact-looking one is ignored
        let candidates = vec![candidate("a", Some(200))];
        assert!(matches!(
            select_match(None, &candidates, 5),
            Err(StageError::NoAcceptableMatch)
        ));
    }

    #[test]
    fn test_candidate_without_duration_never_matches() {
        let candidates = vec![candidate("a", None), candidate("b", Some(201))];
        let chosen = select_match(Some(200), &candidates, 5).unwrap();
        assert_eq!(chosen.video_id, "b");
    }

    #[test]
    fn test_empty_candidate_list() {
        assert!(matches!(
            select_match(Some(200), &[], 5),
            Err(StageError::NoAcceptableMatch)
        ));
    }
}
