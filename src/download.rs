use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use tempfile::NamedTempFile;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::catalog::Issue;
use crate::config::Settings;
use crate::error::{PipelineError, Result};

const DOWNLOAD_TIMEOUT_SECS: u64 = 30;

/// Download stats returned after completion.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DownloadStats {
    pub total: usize,
    pub downloaded: usize,
    pub cached: usize,
    pub failed: usize,
}

#[derive(Debug)]
enum Fetched {
    Downloaded,
    Cached,
    Failed(String),
}

/// Fetch every issue PDF that is not already on disk. A failed issue is
/// logged and counted; the rest keep going.
pub async fn download_issues(settings: &Settings, issues: &[Issue]) -> Result<DownloadStats> {
    let pdf_dir = settings.pdf_dir();
    std::fs::create_dir_all(&pdf_dir)?;

    let client = Client::builder()
        .user_agent(settings.user_agent.as_str())
        .timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
        .build()?;
    let concurrency = settings.download_concurrency.max(1);
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let total = issues.len();

    let pb = ProgressBar::new(total as u64);
    if let Ok(style) = ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})") {
        pb.set_style(style.progress_chars("=> "));
    }

    let (tx, mut rx) = tokio::sync::mpsc::channel::<(String, Fetched)>(concurrency * 2);

    for issue in issues {
        let client = client.clone();
        let sem = Arc::clone(&semaphore);
        let tx = tx.clone();
        let dest = pdf_dir.join(issue.pdf_filename());
        let url = issue.source_url.clone();
        let label = issue.label.clone();
        let retries = settings.download_retries;
        let backoff = Duration::from_secs(settings.download_backoff_secs);
        let delay = Duration::from_millis(settings.request_delay_ms);

        tokio::spawn(async move {
            let Ok(_permit) = sem.acquire().await else {
                return;
            };
            let fetched = if dest.exists() {
                Fetched::Cached
            } else {
                let result = match download_with_retry(&client, &url, &dest, retries, backoff).await {
                    Ok(()) => Fetched::Downloaded,
                    Err(e) => Fetched::Failed(e.to_string()),
                };
                tokio::time::sleep(delay).await;
                result
            };
            let _ = tx.send((label, fetched)).await;
        });
    }

    // Drop our copy of tx so rx closes when all spawned tasks finish
    drop(tx);

    let mut stats = DownloadStats {
        total,
        ..Default::default()
    };
    while let Some((label, fetched)) = rx.recv().await {
        match fetched {
            Fetched::Downloaded => stats.downloaded += 1,
            Fetched::Cached => stats.cached += 1,
            Fetched::Failed(reason) => {
                warn!("Download failed for {}: {}", label, reason);
                stats.failed += 1;
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!(
        "Downloaded {} PDFs ({} new, {} cached, {} failed)",
        total, stats.downloaded, stats.cached, stats.failed
    );
    Ok(stats)
}

async fn download_with_retry(
    client: &Client,
    url: &str,
    dest: &Path,
    retries: u32,
    backoff: Duration,
) -> Result<()> {
    let attempts = retries.max(1);
    let mut last_err = None;
    for attempt in 1..=attempts {
        match download_one(client, url, dest).await {
            Ok(()) => return Ok(()),
            Err(e) => {
                warn!("Download {} failed (attempt {}/{}): {}", url, attempt, attempts, e);
                last_err = Some(e);
            }
        }
        if attempt < attempts {
            tokio::time::sleep(backoff * attempt).await;
        }
    }
    Err(last_err.unwrap_or_else(|| PipelineError::Http(format!("no attempt made for {}", url))))
}

/// Streams the body into a temp file beside `dest`, renamed into place only
/// once the whole body has arrived.
async fn download_one(client: &Client, url: &str, dest: &Path) -> Result<()> {
    let mut resp = client.get(url).send().await?;
    if !resp.status().is_success() {
        return Err(PipelineError::Http(format!("status {} for {}", resp.status(), url)));
    }
    let dir: PathBuf = dest.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
    let mut tmp = NamedTempFile::new_in(&dir)?;
    while let Some(chunk) = resp.chunk().await? {
        tmp.write_all(&chunk)?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(dest).map_err(|e| e.error)?;
    Ok(())
}
