use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::catalog::Issue;
use crate::error::{PipelineError, Result};

/// Supplies the ordered per-page text of one issue. Pages that failed
/// extraction come back as empty strings so page order is preserved.
pub trait PageTextSource: Sync {
    fn pages(&self, issue: &Issue) -> Result<Vec<String>>;
}

/// Extracts page text straight from the downloaded PDF.
pub struct PdfPageSource {
    pdf_dir: PathBuf,
}

impl PdfPageSource {
    pub fn new(pdf_dir: impl Into<PathBuf>) -> Self {
        Self {
            pdf_dir: pdf_dir.into(),
        }
    }
}

impl PageTextSource for PdfPageSource {
    fn pages(&self, issue: &Issue) -> Result<Vec<String>> {
        let path = self.pdf_dir.join(issue.pdf_filename());
        if !path.exists() {
            return Err(PipelineError::MissingInput(path));
        }
        let bytes = std::fs::read(&path)?;
        let pages = extract_pages(&path, &bytes)?;
        debug!("{}: {} pages", path.display(), pages.len());
        Ok(pages)
    }
}

fn extract_pages(path: &Path, bytes: &[u8]) -> Result<Vec<String>> {
    let pdf_error = |reason: String| PipelineError::Pdf {
        path: path.to_path_buf(),
        reason,
    };
    // pdf-extract panics on some malformed documents
    match panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    })) {
        Ok(Ok(pages)) => Ok(pages),
        Ok(Err(e)) => Err(pdf_error(e.to_string())),
        Err(_) => Err(pdf_error("extractor panicked on malformed document".to_string())),
    }
}

/// Reads `<pdf file name>.pages.json`, a JSON array of page strings
/// produced by an external extractor.
pub struct JsonPageSource {
    dir: PathBuf,
}

impl JsonPageSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, issue: &Issue) -> PathBuf {
        self.dir.join(format!("{}.pages.json", issue.pdf_filename()))
    }
}

impl PageTextSource for JsonPageSource {
    fn pages(&self, issue: &Issue) -> Result<Vec<String>> {
        let path = self.path_for(issue);
        if !path.exists() {
            return Err(PipelineError::MissingInput(path));
        }
        let raw = std::fs::read_to_string(&path)?;
        let pages: Vec<Option<String>> = serde_json::from_str(&raw)?;
        Ok(pages.into_iter().map(Option::unwrap_or_default).collect())
    }
}

/// Prefers a `.pages.json` sidecar when present, otherwise the PDF itself.
pub struct IssuePages {
    json: JsonPageSource,
    pdf: PdfPageSource,
}

impl IssuePages {
    pub fn new(pdf_dir: impl Into<PathBuf>) -> Self {
        let dir = pdf_dir.into();
        Self {
            json: JsonPageSource::new(dir.clone()),
            pdf: PdfPageSource::new(dir),
        }
    }
}

impl PageTextSource for IssuePages {
    fn pages(&self, issue: &Issue) -> Result<Vec<String>> {
        if self.json.path_for(issue).exists() {
            self.json.pages(issue)
        } else {
            self.pdf.pages(issue)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue() -> Issue {
        Issue {
            label: "June 2021".into(),
            year: Some(2021),
            month: Some("June".into()),
            source_url: "https://x.org/files/june-2021.pdf".into(),
        }
    }

    #[test]
    fn missing_pdf_is_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = PdfPageSource::new(dir.path()).pages(&issue()).unwrap_err();
        assert!(matches!(err, PipelineError::MissingInput(p) if p.ends_with("june-2021.pdf")));
    }

    #[test]
    fn json_sidecar_null_pages_become_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("june-2021.pdf.pages.json"),
            r#"["PAGE ONE", null, "PAGE THREE"]"#,
        )
        .unwrap();
        let pages = IssuePages::new(dir.path()).pages(&issue()).unwrap();
        assert_eq!(pages, vec!["PAGE ONE", "", "PAGE THREE"]);
    }

    #[test]
    fn garbage_pdf_is_an_error_not_a_panic() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("june-2021.pdf"), b"not a pdf").unwrap();
        let err = PdfPageSource::new(dir.path()).pages(&issue()).unwrap_err();
        assert!(matches!(err, PipelineError::Pdf { .. }));
    }
}
