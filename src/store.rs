use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::cards::render::{render_json, render_markdown};
use crate::cards::NamedCard;
use crate::catalog::Issue;
use crate::config::Settings;
use crate::error::Result;
use crate::manifest::Manifest;
use crate::parser::record::IssueArticles;

/// Filesystem layout for cards:
/// `<json_root>/<year>/<issue_slug>/<slug>.json` and the same under `<md_root>` with `.md`.
#[derive(Debug, Clone)]
pub struct CardStore {
    json_root: PathBuf,
    md_root: PathBuf,
}

impl CardStore {
    pub fn new(json_root: impl Into<PathBuf>, md_root: impl Into<PathBuf>) -> Self {
        Self {
            json_root: json_root.into(),
            md_root: md_root.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.cards_json_dir(), settings.cards_md_dir())
    }

    pub fn json_dir(&self, issue: &Issue) -> PathBuf {
        self.json_root.join(issue.year_dir()).join(issue.slug())
    }

    pub fn md_dir(&self, issue: &Issue) -> PathBuf {
        self.md_root.join(issue.year_dir()).join(issue.slug())
    }

    /// Writes both renderings of a card. Each goes to a temp file in its
    /// target directory first; neither is moved into place until both are
    /// fully written, so a crash never leaves one form without the other
    /// or a truncated file under the final name.
    pub fn write_card(&self, issue: &Issue, named: &NamedCard) -> Result<()> {
        let json_dir = self.json_dir(issue);
        let md_dir = self.md_dir(issue);
        std::fs::create_dir_all(&json_dir)?;
        std::fs::create_dir_all(&md_dir)?;

        let json_tmp = staged(&json_dir, render_json(&named.card)?.as_bytes())?;
        let md_tmp = staged(&md_dir, render_markdown(&named.card).as_bytes())?;

        let json_path = json_dir.join(format!("{}.json", named.slug));
        let md_path = md_dir.join(format!("{}.md", named.slug));
        json_tmp.persist(&json_path).map_err(|e| e.error)?;
        if let Err(e) = md_tmp.persist(&md_path) {
            let _ = std::fs::remove_file(&json_path);
            return Err(e.error.into());
        }
        debug!("Wrote card {}", json_path.display());
        Ok(())
    }
}

fn staged(dir: &Path, contents: &[u8]) -> Result<NamedTempFile> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    Ok(tmp)
}

/// Replace `path` with `contents` via a sibling temp file.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;
    staged(dir, contents)?
        .persist(path)
        .map_err(|e| e.error)?;
    Ok(())
}

pub fn issue_articles_path(dir: &Path, issue: &Issue) -> PathBuf {
    dir.join(format!("{}_{}.json", issue.year_dir(), issue.slug()))
}

pub fn save_issue_articles(dir: &Path, batch: &IssueArticles) -> Result<PathBuf> {
    let path = issue_articles_path(dir, &batch.issue);
    write_atomic(&path, serde_json::to_string_pretty(batch)?.as_bytes())?;
    Ok(path)
}

pub fn load_issue_articles(path: &Path) -> Result<IssueArticles> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Intermediate article files in name order.
pub fn list_issue_articles(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();
    Ok(paths)
}

pub fn save_manifest(path: &Path, manifest: &Manifest) -> Result<()> {
    write_atomic(path, serde_json::to_string_pretty(manifest)?.as_bytes())
}
