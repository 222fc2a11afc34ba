use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::Result;

const DEFAULT_ARCHIVE_URL: &str = "https://www.nesacs.org/the-nucleus/";
const DEFAULT_USER_AGENT: &str = "NESACS-Nucleus-Indexer/1.0 (mailto:info@example.com)";

/// Runtime settings: built-in defaults, then `nucleus.toml`, then `NUCLEUS_*` env vars.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub archive_url: String,
    pub user_agent: String,
    /// Catalog, cards and manifest live here.
    pub data_dir: PathBuf,
    /// Downloaded PDFs and intermediate article files.
    pub work_dir: PathBuf,
    pub download_retries: u32,
    pub download_backoff_secs: u64,
    pub request_delay_ms: u64,
    pub download_concurrency: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            archive_url: DEFAULT_ARCHIVE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            data_dir: PathBuf::from("data"),
            work_dir: PathBuf::from("tmp"),
            download_retries: 3,
            download_backoff_secs: 3,
            request_delay_ms: 2000,
            download_concurrency: 2,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        let d = Settings::default();
        let settings = Config::builder()
            .set_default("archive_url", d.archive_url)?
            .set_default("user_agent", d.user_agent)?
            .set_default("data_dir", d.data_dir.to_string_lossy().to_string())?
            .set_default("work_dir", d.work_dir.to_string_lossy().to_string())?
            .set_default("download_retries", d.download_retries as i64)?
            .set_default("download_backoff_secs", d.download_backoff_secs as i64)?
            .set_default("request_delay_ms", d.request_delay_ms as i64)?
            .set_default("download_concurrency", d.download_concurrency as i64)?
            .add_source(File::with_name("nucleus").required(false))
            .add_source(Environment::with_prefix("NUCLEUS"))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Apply `--data-dir` / `--work-dir` from the command line.
    pub fn with_overrides(mut self, data_dir: Option<PathBuf>, work_dir: Option<PathBuf>) -> Self {
        if let Some(dir) = data_dir {
            self.data_dir = dir;
        }
        if let Some(dir) = work_dir {
            self.work_dir = dir;
        }
        self
    }

    /// Settings rooted at a single directory.
    pub fn rooted(root: &Path) -> Self {
        Self {
            data_dir: root.join("data"),
            work_dir: root.join("tmp"),
            ..Settings::default()
        }
    }

    pub fn issues_path(&self) -> PathBuf {
        self.data_dir.join("issues.json")
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.data_dir.join("manifest.json")
    }

    pub fn cards_json_dir(&self) -> PathBuf {
        self.data_dir.join("cards_json")
    }

    pub fn cards_md_dir(&self) -> PathBuf {
        self.data_dir.join("cards_md")
    }

    pub fn pdf_dir(&self) -> PathBuf {
        self.work_dir.join("pdfs")
    }

    pub fn articles_dir(&self) -> PathBuf {
        self.work_dir.join("articles")
    }
}
