//! CLI-level errors (wraps application errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Application(#[from] ApplicationError),

    #[error("required command missing")]
    MissingCommand,

    #[error("unknown command ({0})")]
    UnknownCommand(String),

    #[error("{command}: {expected} required")]
    ArgumentCount {
        command: &'static str,
        expected: &'static str,
    },

    #[error("invalid {name}: '{value}' is not a numeric id")]
    InvalidArgument { name: &'static str, value: String },

    #[error("cannot write output: {0}")]
    Output(#[from] std::io::Error),
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// True for mistakes in the invocation itself (nothing was executed).
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            CliError::MissingCommand
                | CliError::UnknownCommand(_)
                | CliError::ArgumentCount { .. }
                | CliError::InvalidArgument { .. }
        )
    }

    /// The domain rule that was violated, if any.
    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            CliError::Application(e) => e.as_domain(),
            _ => None,
        }
    }

    /// Get the exit code for this error; every failure maps to the same status.
    pub fn exit_code(&self) -> i32 {
        crate::exitcode::FAILURE
    }
}
