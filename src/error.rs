//! Unified error handling for the ticktag crate
//!
//! This module provides a unified error type that consolidates all domain-specific
//! errors into a single `Error` enum, while maintaining the ability to use
//! domain-specific errors when needed.
//!
//! # Architecture
//!
//! - [`JobErrorTrait`] - Common interface implemented by all error types
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors
//!
//! Nothing in a job retries on these errors. A failed run exits non-zero and the
//! next scheduled invocation recomputes from the store.

use thiserror::Error;

pub use crate::utils::error::{ClockError, PublishError, StoreError};

/// Common trait for all ticktag error types
pub trait JobErrorTrait: std::error::Error {
    /// Check if this error is likely to clear on the next invocation
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Network-related errors (HTTP, timeout, non-2xx)
    Network,
    /// Malformed payloads
    Parsing,
    /// Configuration and validation errors
    Config,
    /// Publish sink errors
    Publish,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Parsing => "parsing",
            Self::Config => "config",
            Self::Publish => "publish",
        }
    }
}

/// Unified error type for the ticktag crate
#[derive(Error, Debug)]
pub enum Error {
    /// Record store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Clock source errors
    #[error("Clock error: {0}")]
    Clock(#[from] ClockError),

    /// Publish sink errors
    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),

    /// Export rendering errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl JobErrorTrait for StoreError {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Http(_) | Self::Timeout => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Decode(_) | Self::InvalidUrl(_) => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Decode(_) => ErrorCategory::Parsing,
            Self::InvalidUrl(_) => ErrorCategory::Config,
            _ => ErrorCategory::Network,
        }
    }
}

impl JobErrorTrait for ClockError {
    fn is_recoverable(&self) -> bool {
        !matches!(self, Self::MissingSource)
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingSource => ErrorCategory::Config,
            _ => ErrorCategory::Network,
        }
    }
}

impl JobErrorTrait for PublishError {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Http(_) | Self::Conflict | Self::ConflictRetriesExhausted(_) => true,
            Self::Status { status, .. } => *status >= 500,
            Self::Decode(_) => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Decode(_) => ErrorCategory::Parsing,
            _ => ErrorCategory::Publish,
        }
    }
}

impl JobErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Store(e) => e.is_recoverable(),
            Self::Clock(e) => e.is_recoverable(),
            Self::Publish(e) => e.is_recoverable(),
            Self::Json(_) => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Store(e) => e.category(),
            Self::Clock(e) => e.category(),
            Self::Publish(e) => e.category(),
            Self::Json(_) => ErrorCategory::Parsing,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
