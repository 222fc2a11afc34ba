use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::Issue;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub issue_label: String,
    pub year: Option<i32>,
    pub issue_slug: String,
    pub article_count: usize,
}

impl ManifestEntry {
    pub fn for_issue(issue: &Issue, article_count: usize) -> Self {
        Self {
            issue_label: issue.label.clone(),
            year: issue.year,
            issue_slug: issue.slug(),
            article_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub issues: Vec<ManifestEntry>,
}

/// Collects one entry per (year, issue slug). Fed after all workers have
/// joined, so it needs no locking.
#[derive(Debug, Default)]
pub struct ManifestAggregator {
    entries: BTreeMap<(Option<i32>, String), ManifestEntry>,
}

impl ManifestAggregator {
    pub fn add(&mut self, entry: ManifestEntry) {
        self.entries
            .entry((entry.year, entry.issue_slug.clone()))
            .and_modify(|e| e.article_count += entry.article_count)
            .or_insert(entry);
    }

    /// Sorted by year (undated first), then label.
    pub fn finish(self) -> Manifest {
        let mut issues: Vec<ManifestEntry> = self.entries.into_values().collect();
        issues.sort_by(|a, b| {
            (a.year, &a.issue_label, &a.issue_slug).cmp(&(b.year, &b.issue_label, &b.issue_slug))
        });
        Manifest { issues }
    }
}

impl FromIterator<ManifestEntry> for ManifestAggregator {
    fn from_iter<I: IntoIterator<Item = ManifestEntry>>(iter: I) -> Self {
        let mut agg = ManifestAggregator::default();
        for entry in iter {
            agg.add(entry);
        }
        agg
    }
}
