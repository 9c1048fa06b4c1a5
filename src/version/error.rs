use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Rate limited: retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Invalid regex: {0}")]
    InvalidRegex(#[from] fancy_regex::Error),

    #[error("Invalid JSONPath: {0}")]
    InvalidJsonPath(String),

    #[error("Invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid XML document: {0}")]
    Xml(String),

    #[error("Invalid XPath: {0}")]
    InvalidXPath(String),
}

/// Failure of a version check that was actually attempted
#[derive(Debug, Error)]
pub enum CheckError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extract(#[from] ExtractError),
}
