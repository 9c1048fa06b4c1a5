use std::path::PathBuf;

use thiserror::Error;

/// Failure of a whole scan
#[derive(Debug, Error)]
pub enum StoreError {
    /// The `apps` or `buckets` directory is missing; the root is misconfigured
    #[error("Directory not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Scan cancelled")]
    Cancelled,
}

/// Failure to decode a single manifest or install record; never aborts a scan
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Manifest array is empty")]
    Empty,
}
