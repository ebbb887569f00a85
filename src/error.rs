// SPDX-License-Identifier: PMPL-1.0-or-later
//! Error types for the remediation engine

use thiserror::Error;

use crate::issue::IssueId;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the remediation engine
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Document cannot be read: {0}")]
    UnreadableDocument(String),

    #[error("Document rejected: {0}")]
    DocumentLimit(String),

    #[error("Page {0} unavailable: {1}")]
    Page(u32, String),

    #[error("Capability error: {0}")]
    Capability(String),

    #[error("Capability is not configured")]
    CapabilityUnavailable,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Issue not found: {0}")]
    IssueNotFound(IssueId),

    #[error("Issue {0} has no suggestion to accept")]
    NoSuggestion(IssueId),

    #[error("Issue list has already been finalized for this session")]
    IssuesAlreadySet,
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}
