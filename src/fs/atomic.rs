//! Atomic file writes.
//!
//! All writes follow the same pattern: write to a temp file in the target's
//! directory, fsync, then rename over the target. On POSIX `rename()` is
//! atomic when source and destination share a filesystem, which holds here
//! because the temp file is created next to the target. A crash can leave a
//! stale `.{name}.tmp` behind; it is overwritten by the next write.

use crate::error::{Result, ScoutError};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Atomically write bytes to a file, creating parent directories as needed.
pub fn atomic_write<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| {
            ScoutError::StoreError(format!(
                "failed to create parent directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }

    let temp_path = temp_path_for(path)?;
    write_and_sync(&temp_path, content)?;
    replace(&temp_path, path)?;

    Ok(())
}

/// Atomically write a string to a file.
pub fn atomic_write_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    atomic_write(path, content.as_bytes())
}

/// Temp file path in the same directory as the target, so the final rename
/// never crosses a filesystem boundary.
fn temp_path_for(target: &Path) -> Result<PathBuf> {
    let parent = target.parent().unwrap_or(Path::new("."));
    let filename = target
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ScoutError::StoreError("invalid file path".to_string()))?;

    Ok(parent.join(format!(".{}.tmp", filename)))
}

fn write_and_sync(path: &Path, content: &[u8]) -> Result<()> {
    let mut file = File::create(path).map_err(|e| {
        ScoutError::StoreError(format!(
            "failed to create temporary file '{}': {}",
            path.display(),
            e
        ))
    })?;

    let written = file
        .write_all(content)
        .and_then(|()| file.sync_all())
        .map_err(|e| {
            ScoutError::StoreError(format!("failed to write temporary file: {}", e))
        });

    if written.is_err() {
        let _ = fs::remove_file(path);
    }
    written
}

#[cfg(unix)]
fn replace(source: &Path, target: &Path) -> Result<()> {
    // rename() replaces an existing destination atomically on POSIX.
    fs::rename(source, target).map_err(|e| {
        let _ = fs::remove_file(source);
        ScoutError::StoreError(format!(
            "failed to replace '{}': {}",
            target.display(),
            e
        ))
    })?;

    // Persist the directory entry as well.
    if let Some(parent) = target.parent()
        && let Ok(dir) = File::open(parent)
    {
        let _ = dir.sync_all();
    }

    Ok(())
}

#[cfg(not(unix))]
fn replace(source: &Path, target: &Path) -> Result<()> {
    // Windows rename() refuses to clobber. Remove-then-rename leaves a
    // window where the target is missing; readers treat a missing store as
    // empty, so this degrades instead of corrupting.
    if target.exists() {
        fs::remove_file(target).map_err(|e| {
            let _ = fs::remove_file(source);
            ScoutError::StoreError(format!(
                "failed to remove '{}' before replace: {}",
                target.display(),
                e
            ))
        })?;
    }

    fs::rename(source, target).map_err(|e| {
        let _ = fs::remove_file(source);
        ScoutError::StoreError(format!(
            "failed to replace '{}': {}",
            target.display(),
            e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_new_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("test.json");

        atomic_write(&file_path, b"[]").unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "[]");
    }

    #[test]
    fn replace_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("test.json");

        fs::write(&file_path, "original").unwrap();
        atomic_write(&file_path, b"replacement").unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "replacement");
    }

    #[test]
    fn creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join(".scout").join("hints.json");

        atomic_write_file(&file_path, "[]").unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "[]");
    }

    #[test]
    fn no_temp_file_left_behind() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("test.json");

        atomic_write(&file_path, b"content").unwrap();

        assert!(!temp_dir.path().join(".test.json.tmp").exists());
    }

    #[test]
    fn temp_path_is_hidden_sibling() {
        let temp = temp_path_for(Path::new("/some/dir/hints.json")).unwrap();
        assert_eq!(temp, Path::new("/some/dir/.hints.json.tmp"));
    }

    #[test]
    fn empty_content_is_preserved() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("empty.txt");

        atomic_write(&file_path, b"").unwrap();

        assert!(fs::read(&file_path).unwrap().is_empty());
    }
}
