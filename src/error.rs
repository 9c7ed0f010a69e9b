// src/error.rs

//! Unified error handling for the crawler application.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for crawler operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// A search filter file is missing required fields or is not valid JSON.
    /// Aborts the whole invocation before anything is fetched.
    #[error("Malformed filter config {path:?}: {message}")]
    ConfigMalformed { path: PathBuf, message: String },

    /// The output directory for this run bucket already exists.
    #[error("Run bucket {bucket} already exists; this config was already crawled this hour")]
    DuplicateRunBucket { bucket: String },

    /// The fetcher returned an empty document for a target.
    #[error("Empty page returned for {url}")]
    EmptyFetchResult { url: String },

    /// Writing the snapshot file failed, so the run never committed.
    #[error("Failed to commit snapshot for bucket {bucket}: {source}")]
    SnapshotCommit {
        bucket: String,
        #[source]
        source: Box<AppError>,
    },

    /// A string that should be a `yyyy-mm-dd-HH` bucket is not one.
    #[error("Invalid run bucket '{0}', expected yyyy-mm-dd-HH")]
    InvalidBucket(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Crawling error
    #[error("Crawl error for {context}: {message}")]
    Crawl { context: String, message: String },
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a malformed filter config error.
    pub fn malformed(path: impl Into<PathBuf>, message: impl fmt::Display) -> Self {
        Self::ConfigMalformed {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a crawl error with context.
    pub fn crawl(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Crawl {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Wrap a write failure as a snapshot commit failure.
    pub fn snapshot_commit(bucket: impl fmt::Display, source: AppError) -> Self {
        Self::SnapshotCommit {
            bucket: bucket.to_string(),
            source: Box::new(source),
        }
    }

    /// Whether this error only affects a single target and the run can go on.
    pub fn is_target_level(&self) -> bool {
        matches!(
            self,
            Self::EmptyFetchResult { .. } | Self::Http(_) | Self::Crawl { .. }
        )
    }
}
