//! Triage errors.

use thiserror::Error;

/// Errors surfaced by every triage operation.
///
/// Components propagate these unchanged; none is downgraded to a partial
/// or empty result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TriageError {
    /// The build, change, or artifact does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Transport or backend failure. Safe to retry the whole command.
    #[error("service error: {0}")]
    Service(String),

    /// Malformed or contradictory input.
    #[error("invalid argument: {0}")]
    Argument(String),
}

impl TriageError {
    /// Process exit code for this error class.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound(_) => 2,
            Self::Service(_) => 1,
            Self::Argument(_) => 64,
        }
    }
}

/// Result alias used across the core.
pub type Result<T> = std::result::Result<T, TriageError>;
