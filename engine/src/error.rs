//! Error types for the FormSync engine.
//!
//! Field validation failures are not errors: they are returned as data in
//! a [`crate::ValidationResult`]. This enum covers schema defects and
//! storage failures.

use crate::ElementId;
use thiserror::Error;

/// All possible errors from the FormSync engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Schema errors
    #[error("duplicate element id: {0}")]
    DuplicateElementId(ElementId),

    #[error("invalid pattern '{pattern}' on element '{element}': {reason}")]
    InvalidPattern {
        element: ElementId,
        pattern: String,
        reason: String,
    },

    #[error("logic rule '{rule}' references unknown element '{element}'")]
    UnknownLogicReference { rule: String, element: ElementId },

    // Storage errors
    #[error("storage error: {0}")]
    Storage(String),

    #[error("storage quota exceeded: {requested} bytes requested, limit is {limit}")]
    QuotaExceeded { requested: usize, limit: usize },

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
