use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;

use crate::config::Settings;
use crate::error::{PipelineError, Result};
use crate::utils::{collapse_whitespace, percent_decode, slugify};

const ISSUE_SLUG_LEN: usize = 32;
const ARCHIVE_TIMEOUT_SECS: u64 = 15;

static ANCHOR_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());
static FOUR_DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{4}").unwrap());
static ARCHIVE_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z][a-z]+\s)?((?:19|20)\d\d)").unwrap());
static LABEL_MONTH_YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z][a-z]+)\s*(\d{4})").unwrap());

/// One published edition of the periodical.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(rename = "issue_label")]
    pub label: String,
    pub year: Option<i32>,
    pub month: Option<String>,
    #[serde(rename = "pdf_url")]
    pub source_url: String,
}

impl Issue {
    /// Fill a missing year or month from the label.
    pub fn resolved(mut self) -> Self {
        if self.year.is_none() || self.month.is_none() {
            let (year, month) = parse_issue_label(&self.label);
            self.year = self.year.or(year);
            self.month = self.month.or(month);
        }
        self
    }

    pub fn slug(&self) -> String {
        slugify(&self.label, ISSUE_SLUG_LEN)
    }

    /// Directory component for per-year output.
    pub fn year_dir(&self) -> String {
        self.year
            .map(|y| y.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Local file name of the issue PDF, derived from the last URL path segment.
    pub fn pdf_filename(&self) -> String {
        let path = Url::parse(&self.source_url)
            .map(|u| u.path().to_string())
            .unwrap_or_else(|_| self.source_url.clone());
        let base = path.rsplit('/').next().unwrap_or_default();
        let name = percent_decode(base).replace('/', "_").replace("..", "_");
        if name.is_empty() {
            format!("{}.pdf", self.slug())
        } else {
            name
        }
    }
}

/// Canonical month name ("Dec" and "December" both give "December").
pub fn month_name(word: &str) -> Option<String> {
    chrono::Month::from_str(word.trim())
        .ok()
        .map(|m| m.name().to_string())
}

/// Pull (year, month) out of labels like "Vol 104 No 5 - December 2025".
pub fn parse_issue_label(label: &str) -> (Option<i32>, Option<String>) {
    for caps in LABEL_MONTH_YEAR_RE.captures_iter(label) {
        if let Some(month) = month_name(&caps[1]) {
            return (caps[2].parse().ok(), Some(month));
        }
    }
    let year = FOUR_DIGITS_RE
        .find(label)
        .and_then(|m| m.as_str().parse().ok());
    (year, None)
}

pub fn load_catalog(path: &Path) -> Result<Vec<Issue>> {
    let unavailable = |reason: String| PipelineError::CatalogUnavailable {
        path: path.to_path_buf(),
        reason,
    };
    let raw = std::fs::read_to_string(path).map_err(|e| unavailable(e.to_string()))?;
    let issues: Vec<Issue> = serde_json::from_str(&raw).map_err(|e| unavailable(e.to_string()))?;
    Ok(issues.into_iter().map(Issue::resolved).collect())
}

pub fn save_catalog(path: &Path, issues: &[Issue]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(issues)?)?;
    Ok(())
}

/// Fetch the archive page and list every linked issue PDF.
pub async fn scrape_catalog(settings: &Settings) -> Result<Vec<Issue>> {
    let base = Url::parse(&settings.archive_url)
        .map_err(|e| PipelineError::Http(format!("bad archive url: {}", e)))?;
    let client = reqwest::Client::builder()
        .user_agent(settings.user_agent.as_str())
        .timeout(Duration::from_secs(ARCHIVE_TIMEOUT_SECS))
        .build()?;

    info!("Fetching archive: {}", base);
    let html = fetch_page(
        &client,
        base.as_str(),
        settings.download_retries,
        settings.download_backoff_secs,
    )
    .await?;

    let issues = extract_issues(&html, &base);
    info!("Found {} issues (PDF links)", issues.len());
    Ok(issues)
}

async fn fetch_page(client: &reqwest::Client, url: &str, retries: u32, backoff_secs: u64) -> Result<String> {
    for attempt in 1..=retries.max(1) {
        match client.get(url).send().await {
            Ok(resp) if resp.status().is_success() => return Ok(resp.text().await?),
            Ok(resp) => warn!("Got status {} for {}", resp.status(), url),
            Err(e) => warn!("Request to {} failed: {}", url, e),
        }
        if attempt < retries {
            tokio::time::sleep(Duration::from_secs(backoff_secs * attempt as u64)).await;
        }
    }
    Err(PipelineError::Http(format!("gave up on {} after {} attempts", url, retries)))
}

/// Every `<a href="….pdf">` on the page becomes an issue, deduplicated by (url, label).
pub fn extract_issues(html: &str, base: &Url) -> Vec<Issue> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut issues = Vec::new();

    for a in document.select(&ANCHOR_SEL) {
        let Some(href) = a.value().attr("href") else {
            continue;
        };
        if !href.to_lowercase().ends_with(".pdf") {
            continue;
        }

        let text = element_text(&a);
        // Bare "PDF" links carry their date in the surrounding list item or cell
        let context = if FOUR_DIGITS_RE.is_match(&text) {
            text
        } else {
            enclosing_block_text(&a).unwrap_or(text)
        };

        let (year, month) = match ARCHIVE_DATE_RE.captures(&context) {
            Some(caps) => (
                caps[2].parse().ok(),
                caps.get(1).and_then(|m| month_name(m.as_str())),
            ),
            None => (None, None),
        };

        let source_url = base
            .join(href)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| href.to_string());
        let label = clean_label(&context, href);

        if seen.insert((source_url.to_lowercase(), label.clone())) {
            issues.push(Issue {
                label,
                year,
                month,
                source_url,
            });
        }
    }

    issues
}

fn element_text(el: &ElementRef) -> String {
    collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

fn enclosing_block_text(a: &ElementRef) -> Option<String> {
    a.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| matches!(el.value().name(), "li" | "td" | "tr" | "div"))
        .map(|el| element_text(&el))
}

fn clean_label(context: &str, href: &str) -> String {
    let mut label = context.trim();
    if label.to_lowercase().starts_with("the nucleus") {
        label = label["the nucleus".len()..].trim_matches(|c: char| c == ' ' || c == '-');
    }
    if label.is_empty() {
        href.rsplit('/').next().unwrap_or(href).to_string()
    } else {
        label.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://www.nesacs.org/the-nucleus/").unwrap()
    }

    #[test]
    fn label_with_month_and_year() {
        assert_eq!(
            parse_issue_label("Vol 104 No 5 - December 2025"),
            (Some(2025), Some("December".to_string()))
        );
    }

    #[test]
    fn label_with_year_only() {
        assert_eq!(parse_issue_label("Summer Issue 2019"), (Some(2019), None));
        assert_eq!(parse_issue_label("Special edition"), (None, None));
    }

    #[test]
    fn label_skips_capitalised_non_months() {
        // "Nucleus 2021" must not turn "Nucleus" into a month
        assert_eq!(parse_issue_label("Nucleus 2021"), (Some(2021), None));
    }

    #[test]
    fn resolved_keeps_catalog_values() {
        let issue = Issue {
            label: "March 2020".into(),
            year: Some(2021),
            month: None,
            source_url: "https://x.org/a.pdf".into(),
        }
        .resolved();
        assert_eq!(issue.year, Some(2021));
        assert_eq!(issue.month.as_deref(), Some("March"));
    }

    #[test]
    fn pdf_filename_is_decoded_basename() {
        let issue = Issue {
            label: "x".into(),
            year: None,
            month: None,
            source_url: "https://x.org/wp-content/uploads/Nucleus%20Dec%202025.pdf".into(),
        };
        assert_eq!(issue.pdf_filename(), "Nucleus Dec 2025.pdf");
        assert_eq!(issue.year_dir(), "unknown");
    }

    #[test]
    fn extracts_pdf_links_and_dates() {
        let html = r#"
            <ul>
              <li>The Nucleus - <a href="/files/nuc-2023-03.pdf">March 2023</a></li>
              <li>Vol 101 No 2 - February 2022 <a href="files/nuc-2022-02.pdf">PDF</a></li>
              <li><a href="/about">About</a></li>
            </ul>"#;
        let issues = extract_issues(html, &base());
        assert_eq!(issues.len(), 2);

        assert_eq!(issues[0].label, "March 2023");
        assert_eq!(issues[0].year, Some(2023));
        assert_eq!(issues[0].month.as_deref(), Some("March"));
        assert_eq!(issues[0].source_url, "https://www.nesacs.org/files/nuc-2023-03.pdf");

        assert_eq!(issues[1].label, "Vol 101 No 2 - February 2022 PDF");
        assert_eq!(issues[1].year, Some(2022));
        assert_eq!(
            issues[1].source_url,
            "https://www.nesacs.org/the-nucleus/files/nuc-2022-02.pdf"
        );
    }

    #[test]
    fn strips_masthead_prefix_and_dedups() {
        let html = r#"
            <a href="/a.PDF">The Nucleus - June 2021</a>
            <a href="/A.pdf">The Nucleus - June 2021</a>"#;
        let issues = extract_issues(html, &base());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].label, "June 2021");
    }

    #[test]
    fn empty_label_falls_back_to_file_name() {
        let issues = extract_issues(r#"<a href="/f/issue9.pdf">The Nucleus</a>"#, &base());
        assert_eq!(issues[0].label, "issue9.pdf");
        assert_eq!(issues[0].year, None);
    }

    #[test]
    fn catalog_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data/issues.json");
        let issues = vec![Issue {
            label: "Vol 1 - May 1999".into(),
            year: None,
            month: None,
            source_url: "https://x.org/a.pdf".into(),
        }];
        save_catalog(&path, &issues).unwrap();
        let loaded = load_catalog(&path).unwrap();
        assert_eq!(loaded[0].year, Some(1999));
        assert_eq!(loaded[0].month.as_deref(), Some("May"));
    }

    #[test]
    fn missing_catalog_is_unavailable() {
        let err = load_catalog(Path::new("/nonexistent/issues.json")).unwrap_err();
        assert!(matches!(err, PipelineError::CatalogUnavailable { .. }));
    }
}
