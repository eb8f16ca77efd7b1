use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("vector store unavailable at {url} after {attempts} attempts: {reason}")]
    StoreUnavailable { url: String, attempts: u32, reason: String },

    #[error("unsupported file type '{extension}' for {}", path.display())]
    UnsupportedFormat { path: PathBuf, extension: String },

    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("failed to parse {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("vector store request failed: {0}")]
    Backend(String),

    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("generation failed: {0}")]
    Generation(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn parse(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Parse { path: path.into(), reason: reason.to_string() }
    }

    /// True for per-file loader failures that directory ingestion skips over.
    pub fn is_per_file(&self) -> bool {
        matches!(self, Self::UnsupportedFormat { .. } | Self::FileNotFound(_) | Self::Parse { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
