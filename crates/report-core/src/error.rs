use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the class report generator.
#[derive(Error, Debug)]
pub enum ReportError {
    /// The attendance source could not be opened or read at all.
    #[error("Data source unavailable ({path}): {reason}")]
    SourceUnavailable { path: PathBuf, reason: String },

    /// A JSON document could not be parsed or written.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A document sink failed to produce its artifact.
    #[error("Failed to render document for {month}: {reason}")]
    Render { month: String, reason: String },

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReportError {
    /// Shorthand for a [`ReportError::SourceUnavailable`] at `path`.
    pub fn source_unavailable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        ReportError::SourceUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Convenience alias used throughout the report crates.
pub type Result<T> = std::result::Result<T, ReportError>;
