//! Infrastructure-level errors (wraps domain errors)

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::DomainError;

/// Infrastructure errors wrap classified domain errors and add transport concerns.
#[derive(Error, Debug)]
pub enum InfraError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    /// Settings could not be loaded; carries the rendered config error
    #[error("{0}")]
    Settings(String),

    #[error("cannot connect to database {}: {source}", path.display())]
    Connect {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("{context}: {source}")]
    Database {
        context: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("statement timed out: {context}")]
    Timeout { context: String },
}

impl InfraError {
    /// Create a database error with context.
    pub fn database(context: impl Into<String>, source: rusqlite::Error) -> Self {
        Self::Database {
            context: context.into(),
            source,
        }
    }

    /// The domain error behind this failure, if it was classified as one.
    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            Self::Domain(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type for infrastructure layer operations.
pub type InfraResult<T> = Result<T, InfraError>;
