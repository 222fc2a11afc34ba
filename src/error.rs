use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// Page text (or the PDF behind it) is not available for an issue.
    #[error("missing input: {}", .0.display())]
    MissingInput(PathBuf),

    /// The issue catalog itself cannot be read. Fatal for a run.
    #[error("issue catalog unavailable at {}: {reason}", .path.display())]
    CatalogUnavailable { path: PathBuf, reason: String },

    #[error("card rejected: {title}")]
    CardRejected { title: String },

    #[error("PDF extraction failed for {}: {reason}", .path.display())]
    Pdf { path: PathBuf, reason: String },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for PipelineError {
    fn from(e: reqwest::Error) -> Self {
        PipelineError::Http(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
