//! Error types for the ticktag collaborators
//!
//! This module defines the errors raised at network boundaries: the record
//! store, the clock source and the publish sink.

use thiserror::Error;

/// Errors from the tabular record store
#[derive(Error, Debug)]
pub enum StoreError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Non-success status with the response body
    #[error("Store returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body did not match the expected shape
    #[error("Decoding error: {0}")]
    Decode(String),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl StoreError {
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Http(err)
        }
    }
}

/// Errors from the clock source
#[derive(Error, Debug)]
pub enum ClockError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Non-success status
    #[error("Clock returned status {0}")]
    Status(u16),

    /// Clock is required but no endpoint is configured
    #[error("No clock source configured")]
    MissingSource,
}

/// Errors from the publish sink
#[derive(Error, Debug)]
pub enum PublishError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status with the response body
    #[error("Publish sink returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Commit rejected because the remote moved underneath us
    #[error("Commit conflict")]
    Conflict,

    /// Conflict persisted through every retry
    #[error("Commit conflict persisted after {0} attempts")]
    ConflictRetriesExhausted(u32),

    /// Response body did not match the expected shape
    #[error("Decoding error: {0}")]
    Decode(String),
}
