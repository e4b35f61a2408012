//! Exit code constants for the nudge CLI.
//!
//! - 0: Success
//! - 1: User error (outside a repository, empty hint text, bad config)
//! - 2: Git operation failure
//! - 3: Store write failure

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: invoked outside a tracked repository, empty hint text,
/// or invalid configuration.
pub const USER_ERROR: i32 = 1;

/// Git operation failure other than "not a repository".
pub const GIT_FAILURE: i32 = 2;

/// Hint store could not be persisted.
pub const STORE_FAILURE: i32 = 3;
