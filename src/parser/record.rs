use serde::{Deserialize, Serialize};

use crate::catalog::Issue;

use super::segment::RawArticleBlock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub title: String,
    pub body: String,
    #[serde(flatten)]
    pub issue: Issue,
    /// 0-based position within the issue.
    #[serde(rename = "idx")]
    pub sequence_index: usize,
}

pub fn build_record(title: String, block: &RawArticleBlock, issue: &Issue, sequence_index: usize) -> ArticleRecord {
    ArticleRecord {
        title,
        body: block.text.clone(),
        issue: issue.clone(),
        sequence_index,
    }
}

/// Everything the split stage learned about one issue. Written even when
/// `articles` is empty so the manifest can still record a zero count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueArticles {
    pub issue: Issue,
    pub articles: Vec<ArticleRecord>,
}
