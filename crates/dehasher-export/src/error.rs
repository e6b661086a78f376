//! Export error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while rendering or writing an export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// JSON serialization failed.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization failed.
    #[error("YAML serialization failed: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// XML serialization failed.
    #[error("XML serialization failed: {0}")]
    Xml(String),

    /// A display column does not name a known field.
    #[error("unknown display field: {0}")]
    UnknownField(String),

    /// Writing the export file failed.
    #[error("failed to write {path}: {source}")]
    Write {
        /// Target file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl From<ExportError> for dehasher_core::DehasherError {
    fn from(err: ExportError) -> Self {
        Self::Export(err.to_string())
    }
}

/// Result type alias for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;
