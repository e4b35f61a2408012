//! Repository and engine context resolution for scout.
//!
//! Finds the Git repository root from any working directory and resolves the
//! canonical engine state paths under `.scout/`. Both the long-running loop
//! and the short-lived `nudge` command resolve the same context, which is
//! what scopes the hint store to one repository.

use crate::error::{Result, ScoutError};
use crate::git;
use std::env;
use std::path::{Path, PathBuf};

/// Engine state directory relative to the repo root.
pub const SCOUT_DIR: &str = ".scout";

/// File name of the hint store inside the state directory.
pub const HINTS_FILE: &str = "hints.json";

/// File name of the engine configuration inside the state directory.
pub const CONFIG_FILE: &str = "config.yaml";

/// File name of the append-only event log inside the state directory.
pub const EVENTS_FILE: &str = "events.ndjson";

/// Resolved paths for one repository's scout state.
///
/// All paths are absolute.
#[derive(Debug, Clone)]
pub struct ScoutContext {
    /// Absolute path to the repository root.
    pub repo_root: PathBuf,

    /// Absolute path to the engine state directory (`{repo_root}/.scout/`).
    pub scout_dir: PathBuf,
}

impl ScoutContext {
    /// Resolve the context from the current working directory.
    ///
    /// Returns a user error (exit code 1) when invoked outside a tracked
    /// repository.
    pub fn resolve() -> Result<Self> {
        let cwd = env::current_dir().map_err(|e| {
            ScoutError::UserError(format!("failed to get current working directory: {}", e))
        })?;

        Self::resolve_from(&cwd)
    }

    /// Resolve the context from a specific directory.
    ///
    /// This is useful for testing or when the working directory is known.
    pub fn resolve_from<P: AsRef<Path>>(cwd: P) -> Result<Self> {
        let repo_root = git::get_repo_root(cwd)?;
        let scout_dir = repo_root.join(SCOUT_DIR);

        Ok(Self {
            repo_root,
            scout_dir,
        })
    }

    /// Path to the hint store file.
    pub fn hints_file(&self) -> PathBuf {
        self.scout_dir.join(HINTS_FILE)
    }

    /// Path to the engine configuration file.
    pub fn config_file(&self) -> PathBuf {
        self.scout_dir.join(CONFIG_FILE)
    }

    /// Path to the append-only event log.
    pub fn events_file(&self) -> PathBuf {
        self.scout_dir.join(EVENTS_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::create_test_repo;
    use tempfile::TempDir;

    #[test]
    fn resolve_from_repo_root() {
        let temp_dir = create_test_repo();
        let ctx = ScoutContext::resolve_from(temp_dir.path()).unwrap();

        let expected = temp_dir.path().canonicalize().unwrap();
        assert_eq!(ctx.repo_root.canonicalize().unwrap(), expected);
        assert!(ctx.scout_dir.ends_with(SCOUT_DIR));
    }

    #[test]
    fn resolve_from_subdirectory_finds_same_root() {
        let temp_dir = create_test_repo();
        let subdir = temp_dir.path().join("a").join("b");
        std::fs::create_dir_all(&subdir).unwrap();

        let from_root = ScoutContext::resolve_from(temp_dir.path()).unwrap();
        let from_subdir = ScoutContext::resolve_from(&subdir).unwrap();
        assert_eq!(from_root.repo_root, from_subdir.repo_root);
    }

    #[test]
    fn resolve_outside_repo_fails() {
        let temp_dir = TempDir::new().unwrap();
        let err = ScoutContext::resolve_from(temp_dir.path()).unwrap_err();
        assert!(matches!(err, ScoutError::UserError(_)));
    }

    #[test]
    fn state_paths_live_under_scout_dir() {
        let temp_dir = create_test_repo();
        let ctx = ScoutContext::resolve_from(temp_dir.path()).unwrap();

        assert!(ctx.hints_file().starts_with(&ctx.scout_dir));
        assert!(ctx.config_file().starts_with(&ctx.scout_dir));
        assert!(ctx.events_file().starts_with(&ctx.scout_dir));
        assert!(ctx.hints_file().ends_with(HINTS_FILE));
    }
}
