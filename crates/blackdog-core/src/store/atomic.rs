//! Atomic file operations for cache persistence.
//!
//! Writes go to a temp file with a PID+TID suffix next to the target, are
//! synced, then renamed over the target so readers never observe a partially
//! written cache file.

use crate::config::PathsConfig;
use crate::{BlackDogError, Result};
use std::collections::hash_map::DefaultHasher;
use std::fs::{self, OpenOptions};
use std::hash::{Hash, Hasher};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::thread;
use tracing::debug;

/// Read a file to a string.
///
/// Returns `None` if the file doesn't exist.
pub fn atomic_read(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(BlackDogError::Io {
            message: format!("Failed to read {}", path.display()),
            path: Some(path.to_path_buf()),
            source: Some(e),
        }),
    }
}

/// Replace the contents of `path` with `contents` atomically.
pub fn atomic_write(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| BlackDogError::Io {
                message: format!("Failed to create directory {}", parent.display()),
                path: Some(parent.to_path_buf()),
                source: Some(e),
            })?;
        }
    }

    let temp_path = temp_path_for(path);

    let written = write_and_sync(&temp_path, contents).and_then(|()| {
        fs::rename(&temp_path, path).map_err(|e| BlackDogError::Io {
            message: format!(
                "Failed to rename {} to {}",
                temp_path.display(),
                path.display()
            ),
            path: Some(path.to_path_buf()),
            source: Some(e),
        })
    });

    if written.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    written?;

    debug!("Atomically wrote {}", path.display());
    Ok(())
}

fn write_and_sync(temp_path: &Path, contents: &[u8]) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(temp_path)
        .map_err(|e| BlackDogError::io_with_path(e, temp_path))?;

    file.write_all(contents)
        .map_err(|e| BlackDogError::io_with_path(e, temp_path))?;
    file.sync_all()
        .map_err(|e| BlackDogError::io_with_path(e, temp_path))?;
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(
        "{}.{}.{}.{}",
        file_name,
        process::id(),
        thread_id(),
        PathsConfig::TEMP_SUFFIX
    ))
}

/// Get a unique thread identifier.
fn thread_id() -> u64 {
    let mut hasher = DefaultHasher::new();
    format!("{:?}", thread::current().id()).hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("foo.data");

        atomic_write(&path, b"[plugin]\nexists=true\n").unwrap();
        assert_eq!(
            atomic_read(&path).unwrap().as_deref(),
            Some("[plugin]\nexists=true\n")
        );
    }

    #[test]
    fn test_atomic_write_replaces_and_leaves_no_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("foo.data");

        atomic_write(&path, b"first").unwrap();
        atomic_write(&path, b"second").unwrap();

        assert_eq!(atomic_read(&path).unwrap().as_deref(), Some("second"));
        let entries: Vec<_> = fs::read_dir(temp_dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_atomic_read_nonexistent() {
        let temp_dir = TempDir::new().unwrap();
        assert!(atomic_read(&temp_dir.path().join("missing.data"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_atomic_write_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("foo.data");

        atomic_write(&path, b"x").unwrap();
        assert!(path.exists());
    }
}
