//! Application-level errors (wraps domain errors)

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::DomainError;

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("edit {edit} rejected: {source}")]
    EditRejected {
        edit: String,
        #[source]
        source: DomainError,
    },

    #[error("invalid snapshot {path}: {message}")]
    InvalidSnapshot { path: PathBuf, message: String },

    #[error("unsupported snapshot format (expected .json or .toml): {0}")]
    UnsupportedFormat(PathBuf),

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
