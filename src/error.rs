//! Error types shared across the crate.
//!
//! Most of the pipeline never surfaces these to the caller: per-page and
//! per-candidate failures are logged and skipped. They exist so that each
//! stage can propagate with `?` internally and decide locally what to absorb.

use thiserror::Error;

/// Result alias used by fallible operations in this crate.
pub type Result<T> = std::result::Result<T, NewsTraceError>;

#[derive(Debug, Error)]
pub enum NewsTraceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML config error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The snapshot file is absent or does not match the expected schema.
    #[error("snapshot error: {0}")]
    Snapshot(String),
}
