use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::utils::collapse_whitespace;

pub const MAX_POINTS: usize = 6;
/// Below this many sentences the fragment fallback kicks in.
pub const MIN_SENTENCES: usize = 3;
/// Sentence scan stops once this many are collected.
pub const SENTENCE_TARGET: usize = 4;
pub const SENTENCE_MIN_LEN: usize = 30;
pub const SENTENCE_MAX_LEN: usize = 180;

static SENTENCE_END_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.(?:\s|$)").unwrap());
static FRAGMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Z][^.]{20,120}").unwrap());

const BULLET_GLYPHS: &[char] = &['-', '*', '•'];

/// Extractive bullet points in document order. May return fewer than three
/// points for very short bodies; the card validator rejects those.
pub fn summarize(body: &str) -> Vec<String> {
    let mut points = Vec::new();

    for sentence in SENTENCE_END_RE.split(body) {
        let s = collapse_whitespace(sentence);
        let len = s.chars().count();
        if (SENTENCE_MIN_LEN..SENTENCE_MAX_LEN).contains(&len) {
            points.push(s.trim_start_matches(BULLET_GLYPHS).trim().to_string());
        }
        if points.len() == SENTENCE_TARGET {
            break;
        }
    }

    if points.len() < MIN_SENTENCES {
        points.extend(
            FRAGMENT_RE
                .find_iter(body)
                .map(|m| collapse_whitespace(m.as_str())),
        );
    }

    let mut seen = HashSet::new();
    points.retain(|p| !p.is_empty() && seen.insert(p.clone()));
    points.truncate(MAX_POINTS);
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_mid_length_sentences_in_order() {
        let body = "Short one. The section met in Cambridge to plan the spring symposium. \
                    Officers were elected by a show of hands at the end of the meeting. \
                    Refreshments were provided by the student affiliates chapter.";
        let points = summarize(body);
        assert_eq!(
            points,
            vec![
                "The section met in Cambridge to plan the spring symposium",
                "Officers were elected by a show of hands at the end of the meeting",
                "Refreshments were provided by the student affiliates chapter",
            ]
        );
    }

    #[test]
    fn stops_after_four_sentences() {
        let body = (0..8)
            .map(|i| format!("Sentence number {} is long enough to be a summary point", i))
            .collect::<Vec<_>>()
            .join(". ");
        let points = summarize(&body);
        assert_eq!(points.len(), 4);
        assert!(points[3].starts_with("Sentence number 3"));
    }

    #[test]
    fn strips_bullet_glyphs() {
        let body = "• Members voted to fund two new undergraduate travel grants. \
                    - The treasurer reported a healthy balance for the fiscal year. \
                    * Next meeting will be held at Boston College in the fall.";
        let points = summarize(body);
        assert_eq!(points.len(), 3);
        assert!(points[0].starts_with("Members voted"));
        assert!(points[1].starts_with("The treasurer"));
        assert!(points[2].starts_with("Next meeting"));
    }

    #[test]
    fn long_sentences_are_skipped() {
        let long = format!("A {} end", "very ".repeat(40));
        let body = format!("{}. This sentence has a perfectly ordinary length to it.", long);
        let points = summarize(&body);
        assert!(points.iter().all(|p| p.chars().count() < SENTENCE_MAX_LEN));
        assert!(points.contains(&"This sentence has a perfectly ordinary length to it".to_string()));
    }

    #[test]
    fn fragment_fallback_fills_short_bodies() {
        let body = "Award winners\nDr Jane Smith of Tufts University won the Norris Award\n\
                    Prof Alan Wu of MIT received the Leadership Prize this year";
        let points = summarize(body);
        // No sentence breaks: the scan finds one point and fragments supply the rest
        assert!(points.len() >= 2);
        assert!(points.iter().any(|p| p.contains("Norris Award")));
        assert!(points.iter().all(|p| !p.contains('\n')));
    }

    #[test]
    fn duplicates_removed_and_capped_at_six() {
        let body = "Tiny. Tiny. Alpha Beta Gamma Delta Epsilon Zeta; Alpha Beta Gamma Delta Epsilon Zeta";
        let points = summarize(body);
        let unique: HashSet<_> = points.iter().collect();
        assert_eq!(unique.len(), points.len());
        assert!(points.len() <= MAX_POINTS);
    }
}
