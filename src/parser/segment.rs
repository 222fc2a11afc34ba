use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::utils::collapse_whitespace;

/// Spans at or below this many characters (trimmed) are mastheads, TOC lines or ad blurbs.
pub const HEADING_MIN_LEN: usize = 180;
/// Paragraph fallback is noisier, so it demands more text per block.
pub const PARAGRAPH_MIN_LEN: usize = 200;

// A heading line is either an all-caps run, or a Title Case line directly
// followed by a "by <Name>" byline. Mixed-case lines without a byline are body text.
static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^(?:[A-Z][A-Z0-9 ,\-()&':]{9,79}|[A-Z][A-Za-z0-9 ,\-()&':]{9,79}\n[Bb]y [A-Z][^\n]{1,50})$",
    )
    .unwrap()
});
static PARAGRAPH_BREAK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n(?:[ \t]*\n)+").unwrap());

/// A candidate article: trimmed span text plus its byte offset in the joined issue text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawArticleBlock {
    pub start: usize,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    HeadingPattern,
    ParagraphBreaks,
}

/// Tried in order; the first strategy that yields any block wins.
pub const STRATEGY_CHAIN: &[Strategy] = &[Strategy::HeadingPattern, Strategy::ParagraphBreaks];

impl Strategy {
    pub fn name(self) -> &'static str {
        match self {
            Strategy::HeadingPattern => "heading",
            Strategy::ParagraphBreaks => "paragraph",
        }
    }

    pub fn min_len(self) -> usize {
        match self {
            Strategy::HeadingPattern => HEADING_MIN_LEN,
            Strategy::ParagraphBreaks => PARAGRAPH_MIN_LEN,
        }
    }

    /// Byte ranges of candidate spans, before any length filtering.
    fn spans(self, text: &str) -> Vec<(usize, usize)> {
        match self {
            Strategy::HeadingPattern => {
                let starts: Vec<usize> = HEADING_RE.find_iter(text).map(|m| m.start()).collect();
                starts
                    .iter()
                    .enumerate()
                    .map(|(i, &s)| (s, starts.get(i + 1).copied().unwrap_or(text.len())))
                    .collect()
            }
            Strategy::ParagraphBreaks => {
                let mut spans = Vec::new();
                let mut last = 0;
                for m in PARAGRAPH_BREAK_RE.find_iter(text) {
                    spans.push((last, m.start()));
                    last = m.end();
                }
                spans.push((last, text.len()));
                spans
            }
        }
    }

    pub fn split(self, text: &str) -> Vec<RawArticleBlock> {
        let min = self.min_len();
        self.spans(text)
            .into_iter()
            .filter_map(|(a, b)| {
                let span = &text[a..b];
                let trimmed = span.trim();
                if trimmed.chars().count() <= min {
                    return None;
                }
                Some(RawArticleBlock {
                    start: a + (span.len() - span.trim_start().len()),
                    text: trimmed.to_string(),
                })
            })
            .collect()
    }
}

/// Pages are joined with a newline each; unreadable pages contribute nothing but the separator.
pub fn join_pages(pages: &[String]) -> String {
    pages.join("\n")
}

/// Partition an issue's page text into deduplicated candidate articles.
/// Never fails: an issue that defeats every strategy yields an empty Vec.
pub fn split_articles(pages: &[String]) -> Vec<RawArticleBlock> {
    let joined = join_pages(pages);
    for strategy in STRATEGY_CHAIN {
        let blocks = strategy.split(&joined);
        if !blocks.is_empty() {
            debug!("{} strategy produced {} spans", strategy.name(), blocks.len());
            return dedup_blocks(blocks);
        }
    }
    Vec::new()
}

pub fn content_hash(text: &str) -> String {
    hex::encode(Sha256::digest(collapse_whitespace(text).as_bytes()))
}

/// Keep the first block of each distinct normalized content, in document order.
pub fn dedup_blocks(blocks: Vec<RawArticleBlock>) -> Vec<RawArticleBlock> {
    let mut seen = HashSet::new();
    blocks
        .into_iter()
        .filter(|b| seen.insert(content_hash(&b.text)))
        .collect()
}
