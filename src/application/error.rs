//! Application-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::domain::DomainError;
use crate::infrastructure::InfraError;

/// Application errors wrap data access errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("config error: {message}")]
    Config { message: String },
}

impl ApplicationError {
    /// The domain rule that was violated, if any.
    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            Self::Infra(e) => e.as_domain(),
            Self::Config { .. } => None,
        }
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
