pub mod render;
pub mod slug;
pub mod summary;
pub mod tags;
pub mod validate;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::parser::record::ArticleRecord;
use crate::utils::truncate_chars;

pub const MAX_TITLE_LEN: usize = 120;

/// Validated summary of one article; the unit of output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub title: String,
    pub summary: Vec<String>,
    pub tags: Vec<String>,
    pub issue_label: String,
    pub year: Option<i32>,
    pub month: Option<String>,
    pub source_url: String,
}

/// An accepted card together with its file stem.
#[derive(Debug, Clone)]
pub struct NamedCard {
    pub slug: String,
    pub card: Card,
}

pub fn build_card(record: &ArticleRecord) -> Card {
    Card {
        title: truncate_chars(&record.title, MAX_TITLE_LEN).trim().to_string(),
        summary: summary::summarize(&record.body),
        tags: tags::extract_tags(&record.title, &record.body),
        issue_label: record.issue.label.clone(),
        year: record.issue.year,
        month: record.issue.month.clone(),
        source_url: record.issue.source_url.clone(),
    }
}

/// Record → card → validation → slug. Rejection carries the title for the log.
pub fn synthesize(record: &ArticleRecord) -> Result<NamedCard, PipelineError> {
    let card = build_card(record);
    if let Err(violation) = validate::validate_card(&card) {
        tracing::debug!("{}: {}", card.title, violation);
        return Err(PipelineError::CardRejected { title: card.title });
    }
    Ok(NamedCard {
        slug: slug::card_slug(&card.title),
        card,
    })
}
