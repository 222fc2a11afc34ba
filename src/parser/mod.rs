pub mod record;
pub mod segment;
pub mod title;

use crate::catalog::Issue;
use record::ArticleRecord;

/// Two-pass pipeline: page text → raw blocks → titled article records.
pub fn process_issue(issue: &Issue, pages: &[String]) -> Vec<ArticleRecord> {
    segment::split_articles(pages)
        .iter()
        .enumerate()
        .map(|(i, block)| {
            let title = title::infer_title(&block.text, i + 1);
            record::build_record(title, block, issue, i)
        })
        .collect()
}
