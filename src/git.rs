//! Git command runner for scout.
//!
//! Provides a safe wrapper around git commands with captured stdout/stderr
//! and structured error handling. The engine only needs git for one thing:
//! resolving the enclosing repository root that scopes the hint store.

use crate::error::{Result, ScoutError};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Result of a successful git command execution.
#[derive(Debug, Clone)]
pub struct GitOutput {
    /// Standard output from the command (trimmed).
    pub stdout: String,
    /// Standard error from the command (trimmed).
    pub stderr: String,
}

impl GitOutput {
    fn from_output(output: &Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
    }
}

/// Run a git command with the specified working directory.
///
/// Returns `Ok(GitOutput)` on exit code 0, otherwise a `GitError` carrying
/// whichever of stderr/stdout the failing command produced.
pub fn run_git<P: AsRef<Path>>(cwd: P, args: &[&str]) -> Result<GitOutput> {
    let cwd = cwd.as_ref();

    let output = Command::new("git")
        .current_dir(cwd)
        .args(args)
        .output()
        .map_err(|e| {
            ScoutError::GitError(format!(
                "failed to execute git {}: {}",
                args.first().unwrap_or(&""),
                e
            ))
        })?;

    let git_output = GitOutput::from_output(&output);

    if output.status.success() {
        Ok(git_output)
    } else {
        let exit_code = output.status.code().unwrap_or(-1);
        let error_msg = if git_output.stderr.is_empty() {
            git_output.stdout.clone()
        } else {
            git_output.stderr.clone()
        };

        Err(ScoutError::GitError(format!(
            "git {} failed (exit code {}): {}",
            args.first().unwrap_or(&""),
            exit_code,
            error_msg
        )))
    }
}

/// Get the repository root directory using `git rev-parse --show-toplevel`.
///
/// Works from any location within a git repository, including from within
/// linked worktrees (an agent working copy is one). "Not inside a
/// repository" is a clean user error (exit 1), not a git failure.
pub fn get_repo_root<P: AsRef<Path>>(cwd: P) -> Result<PathBuf> {
    let cwd = cwd.as_ref();

    let output = Command::new("git")
        .current_dir(cwd)
        .args(["rev-parse", "--show-toplevel"])
        .output()
        .map_err(|e| {
            ScoutError::UserError(format!("failed to execute git: {} (is git installed?)", e))
        })?;

    let git_output = GitOutput::from_output(&output);

    if output.status.success() {
        Ok(PathBuf::from(&git_output.stdout))
    } else if git_output.stderr.contains("not a git repository")
        || git_output.stderr.contains("fatal:")
    {
        Err(ScoutError::UserError(
            "not inside a git repository. Run this command from within a tracked repository."
                .to_string(),
        ))
    } else {
        Err(ScoutError::UserError(format!(
            "git command failed: {}",
            if git_output.stderr.is_empty() {
                &git_output.stdout
            } else {
                &git_output.stderr
            }
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::create_test_repo;
    use tempfile::TempDir;

    #[test]
    fn run_git_success() {
        let temp_dir = create_test_repo();
        let result = run_git(temp_dir.path(), &["status", "--porcelain"]);
        assert!(result.is_ok());
    }

    #[test]
    fn run_git_captures_stdout() {
        let temp_dir = create_test_repo();
        let output = run_git(temp_dir.path(), &["rev-parse", "--show-toplevel"]).unwrap();
        assert!(!output.stdout.is_empty());
    }

    #[test]
    fn run_git_failure_returns_git_error() {
        let temp_dir = create_test_repo();
        let result = run_git(temp_dir.path(), &["checkout", "nonexistent-branch"]);
        assert!(matches!(result, Err(ScoutError::GitError(_))));
    }

    #[test]
    fn repo_root_from_root() {
        let temp_dir = create_test_repo();
        let root = get_repo_root(temp_dir.path()).unwrap();
        let expected = temp_dir.path().canonicalize().unwrap();
        assert_eq!(root.canonicalize().unwrap(), expected);
    }

    #[test]
    fn repo_root_from_subdirectory() {
        let temp_dir = create_test_repo();
        let subdir = temp_dir.path().join("subdir").join("nested");
        std::fs::create_dir_all(&subdir).unwrap();

        let root = get_repo_root(&subdir).unwrap();
        let expected = temp_dir.path().canonicalize().unwrap();
        assert_eq!(root.canonicalize().unwrap(), expected);
    }

    #[test]
    fn repo_root_outside_repo_is_user_error() {
        let temp_dir = TempDir::new().unwrap(); // Not a git repo
        let err = get_repo_root(temp_dir.path()).unwrap_err();
        assert!(matches!(err, ScoutError::UserError(_)));
        assert!(err.to_string().contains("not inside a git repository"));
    }
}
