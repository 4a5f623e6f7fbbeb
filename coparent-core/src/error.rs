//! Error types for the coparent ecosystem.

use thiserror::Error;

/// Errors that can occur in coparent operations.
#[derive(Error, Debug)]
pub enum CoParentError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Event not found: {0}")]
    EventNotFound(u64),

    #[error("ICS parse error: {0}")]
    IcsParse(String),

    #[error("ICS generation error: {0}")]
    IcsGenerate(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for coparent operations.
pub type CoParentResult<T> = Result<T, CoParentError>;
