//! Error types for the scout engine.
//!
//! Uses thiserror for derive macros and provides user-actionable error
//! messages. Process-execution failures never appear here: the backend layer
//! captures them into an `ExecutionResult` so the calling loop can apply its
//! own retry policy.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for scout operations.
///
/// Each variant maps to a specific exit code. Environment problems (wrong
/// directory, bad arguments, invalid config) are user errors; git and store
/// failures get their own codes so wrapping scripts can tell them apart.
#[derive(Error, Debug)]
pub enum ScoutError {
    /// User provided invalid arguments or the command was run in an
    /// invalid environment.
    #[error("{0}")]
    UserError(String),

    /// Git operation failed.
    #[error("Git operation failed: {0}")]
    GitError(String),

    /// The hint store could not be written.
    #[error("Store operation failed: {0}")]
    StoreError(String),
}

impl ScoutError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ScoutError::UserError(_) => exit_codes::USER_ERROR,
            ScoutError::GitError(_) => exit_codes::GIT_FAILURE,
            ScoutError::StoreError(_) => exit_codes::STORE_FAILURE,
        }
    }
}

/// Result type alias for scout operations.
pub type Result<T> = std::result::Result<T, ScoutError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_error_has_correct_exit_code() {
        let err = ScoutError::UserError("bad argument".to_string());
        assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
    }

    #[test]
    fn git_error_has_correct_exit_code() {
        let err = ScoutError::GitError("rev-parse failed".to_string());
        assert_eq!(err.exit_code(), exit_codes::GIT_FAILURE);
    }

    #[test]
    fn store_error_has_correct_exit_code() {
        let err = ScoutError::StoreError("write failed".to_string());
        assert_eq!(err.exit_code(), exit_codes::STORE_FAILURE);
    }

    #[test]
    fn error_messages_are_descriptive() {
        let err = ScoutError::UserError("hint text is empty".to_string());
        assert_eq!(err.to_string(), "hint text is empty");

        let err = ScoutError::StoreError("disk full".to_string());
        assert_eq!(err.to_string(), "Store operation failed: disk full");
    }
}
