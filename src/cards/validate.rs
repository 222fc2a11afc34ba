use std::collections::HashSet;

use thiserror::Error;

use super::Card;

pub const MIN_TITLE_LEN: usize = 4;
pub const SUMMARY_RANGE: std::ops::RangeInclusive<usize> = 3..=6;
pub const TAG_RANGE: std::ops::RangeInclusive<usize> = 3..=8;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum Violation {
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("title shorter than 4 characters")]
    TitleTooShort,
    #[error("summary has {0} points")]
    SummaryCount(usize),
    #[error("tags has {0} entries")]
    TagCount(usize),
    #[error("duplicate tag: {0}")]
    DuplicateTag(String),
    #[error("source url is not http(s): {0}")]
    SourceUrl(String),
}

/// Whole-card check. The first violation found rejects the card.
pub fn validate_card(card: &Card) -> Result<(), Violation> {
    let required = [
        ("title", &card.title),
        ("issue_label", &card.issue_label),
        ("source_url", &card.source_url),
    ];
    for (name, value) in required {
        if value.trim().is_empty() {
            return Err(Violation::MissingField(name));
        }
    }
    if card.summary.iter().any(|p| p.trim().is_empty()) {
        return Err(Violation::MissingField("summary"));
    }

    if !SUMMARY_RANGE.contains(&card.summary.len()) {
        return Err(Violation::SummaryCount(card.summary.len()));
    }
    if !TAG_RANGE.contains(&card.tags.len()) {
        return Err(Violation::TagCount(card.tags.len()));
    }
    let mut seen = HashSet::new();
    if let Some(dup) = card.tags.iter().find(|t| !seen.insert(t.as_str())) {
        return Err(Violation::DuplicateTag(dup.clone()));
    }
    if card.title.chars().count() < MIN_TITLE_LEN {
        return Err(Violation::TitleTooShort);
    }
    if !card.source_url.starts_with("http") {
        return Err(Violation::SourceUrl(card.source_url.clone()));
    }
    Ok(())
}
