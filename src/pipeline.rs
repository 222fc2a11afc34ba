use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::cards;
use crate::catalog::Issue;
use crate::error::Result;
use crate::manifest::{Manifest, ManifestAggregator, ManifestEntry};
use crate::pages::PageTextSource;
use crate::parser::{self, record::IssueArticles};
use crate::store::{self, CardStore};

/// What happened to a single issue. Workers only ever return one of these;
/// nothing raised inside an issue reaches the aggregation step.
#[derive(Debug)]
pub enum IssueOutcome {
    Processed {
        entry: ManifestEntry,
        written: usize,
        rejected: usize,
    },
    Skipped {
        label: String,
        reason: String,
    },
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub issues_processed: usize,
    pub issues_skipped: usize,
    pub cards_written: usize,
    pub cards_rejected: usize,
    pub manifest: Option<Manifest>,
}

impl RunReport {
    fn from_outcomes(outcomes: Vec<IssueOutcome>) -> Self {
        let mut report = RunReport::default();
        let mut manifest = ManifestAggregator::default();
        for outcome in outcomes {
            match outcome {
                IssueOutcome::Processed {
                    entry,
                    written,
                    rejected,
                } => {
                    report.issues_processed += 1;
                    report.cards_written += written;
                    report.cards_rejected += rejected;
                    manifest.add(entry);
                }
                IssueOutcome::Skipped { label, reason } => {
                    warn!("Skipped {}: {}", label, reason);
                    report.issues_skipped += 1;
                }
            }
        }
        report.manifest = Some(manifest.finish());
        report
    }

    pub fn print(&self) {
        println!(
            "Issues: {} processed, {} skipped. Cards: {} written, {} rejected.",
            self.issues_processed, self.issues_skipped, self.cards_written, self.cards_rejected,
        );
    }
}

#[derive(Debug, Default)]
pub struct SplitReport {
    pub issues_split: usize,
    pub issues_skipped: usize,
    pub articles: usize,
}

impl SplitReport {
    pub fn print(&self) {
        println!(
            "Split {} issues into {} articles ({} skipped).",
            self.issues_split, self.articles, self.issues_skipped,
        );
    }
}

/// Page text → article records for one issue.
pub fn split_issue(issue: &Issue, source: &dyn PageTextSource) -> Result<IssueArticles> {
    let pages = source.pages(issue)?;
    let articles = parser::process_issue(issue, &pages);
    info!("{}: {} articles from {} pages", issue.label, articles.len(), pages.len());
    Ok(IssueArticles {
        issue: issue.clone(),
        articles,
    })
}

/// Synthesizes and writes every card of one issue. A card that fails
/// validation, repeats a file name already in `taken`, or cannot be written
/// is counted as rejected and skipped.
pub fn cards_for_issue(batch: &IssueArticles, store: &CardStore, taken: &mut HashSet<String>) -> IssueOutcome {
    let issue = &batch.issue;
    let mut written = 0;
    let mut rejected = 0;

    for record in &batch.articles {
        let named = match cards::synthesize(record) {
            Ok(named) => named,
            Err(e) => {
                warn!("{}: {}", issue.label, e);
                rejected += 1;
                continue;
            }
        };
        if !taken.insert(named.slug.clone()) {
            warn!("{}: duplicate card {} ({})", issue.label, named.card.title, named.slug);
            rejected += 1;
            continue;
        }
        match store.write_card(issue, &named) {
            Ok(()) => written += 1,
            Err(e) => {
                warn!("Failed to write card {}: {}", named.slug, e);
                rejected += 1;
            }
        }
    }

    IssueOutcome::Processed {
        entry: ManifestEntry::for_issue(issue, written),
        written,
        rejected,
    }
}

/// Runs `work` for one issue, turning errors and panics into a skip reason.
fn isolated<T, F>(work: F) -> std::result::Result<T, String>
where
    F: FnOnce() -> Result<T>,
{
    match panic::catch_unwind(AssertUnwindSafe(work)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err("worker panicked".to_string()),
    }
}

fn skipped(label: &str, reason: String) -> IssueOutcome {
    IssueOutcome::Skipped {
        label: label.to_string(),
        reason,
    }
}

/// Issues that share an output directory, i.e. the same (year, issue slug),
/// grouped in catalog order. One worker handles a whole group so no two
/// workers ever write the same path.
fn group_by_output(issues: &[Issue]) -> Vec<Vec<&Issue>> {
    let mut index: HashMap<(Option<i32>, String), usize> = HashMap::new();
    let mut groups: Vec<Vec<&Issue>> = Vec::new();
    for issue in issues {
        let slot = *index.entry((issue.year, issue.slug())).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(issue);
    }
    groups
}

fn progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}

/// Split stage: writes one intermediate articles file per output directory.
/// Issues that collide on (year, slug) are merged into a single file.
pub fn run_split(issues: &[Issue], source: &dyn PageTextSource, articles_dir: &Path) -> SplitReport {
    let groups = group_by_output(issues);
    let pb = progress_bar(issues.len());
    let results: Vec<Vec<std::result::Result<usize, String>>> = groups
        .par_iter()
        .map(|group| {
            let mut merged: Option<IssueArticles> = None;
            let mut results = Vec::with_capacity(group.len());
            for issue in group {
                match isolated(|| split_issue(issue, source)) {
                    Ok(batch) => {
                        results.push(Ok(batch.articles.len()));
                        merged = Some(match merged.take() {
                            Some(mut m) => {
                                m.articles.extend(batch.articles);
                                m
                            }
                            None => batch,
                        });
                    }
                    Err(reason) => {
                        warn!("Skipped {}: {}", issue.label, reason);
                        results.push(Err(reason));
                    }
                }
                pb.inc(1);
            }
            if let Some(batch) = merged {
                if let Err(e) = store::save_issue_articles(articles_dir, &batch) {
                    warn!("Skipped {}: {}", batch.issue.label, e);
                    results = results
                        .into_iter()
                        .map(|r| r.and_then(|_| Err(e.to_string())))
                        .collect();
                }
            }
            results
        })
        .collect();
    pb.finish_and_clear();

    let mut report = SplitReport::default();
    for result in results.into_iter().flatten() {
        match result {
            Ok(n) => {
                report.issues_split += 1;
                report.articles += n;
            }
            Err(_) => report.issues_skipped += 1,
        }
    }
    report
}

/// Cards stage: reads the intermediate files, writes cards and the manifest.
/// Each file maps to its own output directory.
pub fn run_cards(article_files: &[PathBuf], store: &CardStore, manifest_path: &Path) -> Result<RunReport> {
    let pb = progress_bar(article_files.len());
    let outcomes: Vec<IssueOutcome> = article_files
        .par_iter()
        .map(|path| {
            let outcome = isolated(|| {
                let batch = store::load_issue_articles(path)?;
                Ok(cards_for_issue(&batch, store, &mut HashSet::new()))
            })
            .unwrap_or_else(|reason| skipped(&path.display().to_string(), reason));
            pb.inc(1);
            outcome
        })
        .collect();
    pb.finish_and_clear();
    finish_run(outcomes, manifest_path)
}

/// Split and cards in one pass, keeping intermediate files out of the loop.
pub fn run_all(
    issues: &[Issue],
    source: &dyn PageTextSource,
    store: &CardStore,
    manifest_path: &Path,
) -> Result<RunReport> {
    let groups = group_by_output(issues);
    let pb = progress_bar(issues.len());
    let outcomes: Vec<IssueOutcome> = groups
        .par_iter()
        .flat_map_iter(|group| {
            let mut taken = HashSet::new();
            let outcomes: Vec<IssueOutcome> = group
                .iter()
                .map(|issue| {
                    let outcome = isolated(|| {
                        let batch = split_issue(issue, source)?;
                        Ok(cards_for_issue(&batch, store, &mut taken))
                    })
                    .unwrap_or_else(|reason| skipped(&issue.label, reason));
                    pb.inc(1);
                    outcome
                })
                .collect();
            outcomes
        })
        .collect();
    pb.finish_and_clear();
    finish_run(outcomes, manifest_path)
}

fn finish_run(outcomes: Vec<IssueOutcome>, manifest_path: &Path) -> Result<RunReport> {
    let report = RunReport::from_outcomes(outcomes);
    if let Some(manifest) = &report.manifest {
        store::save_manifest(manifest_path, manifest)?;
        info!("Manifest: {} issues -> {}", manifest.issues.len(), manifest_path.display());
    }
    Ok(report)
}
