// src/error.rs

//! Error types for rsbuster.
//!
//! Only configuration and file-access problems are errors. Per-request
//! timeouts and transport failures are `ProbeOutcome` values that the retry
//! policy absorbs, so they never show up here.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error for a scan run.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Wordlist unreadable or log file unwritable.
    #[error("File error: {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Failed to serialize result: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ScanError {
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ScanError::File {
            path: path.into(),
            source,
        }
    }
}

/// Bad or missing arguments, reported before any network activity.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("target URL is empty")]
    EmptyTarget,

    #[error("invalid target URL '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },

    #[error("{name} must be greater than zero")]
    Zero { name: &'static str },
}
