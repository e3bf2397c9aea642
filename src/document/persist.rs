//! Durable file I/O for the document
//!
//! Writes never touch the canonical file in place. The new content goes to a
//! uniquely named sibling temp file, is fsynced, then renamed over the
//! canonical path and the parent directory is fsynced. A crash at any point
//! leaves either the old or the new file at the canonical path, never a
//! truncated one.
//!
//! One store owns a file at a time: `lock_exclusive` takes an advisory lock
//! on `<file>.lock` that lives as long as the returned handle.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde_json::Value;
use tempfile::{Builder, NamedTempFile};

use super::errors::{DocumentError, DocumentResult};
use crate::crash_point::{faults, maybe_crash, maybe_fail, points};

const TEMP_SUFFIX: &str = ".tmp";

/// Outcome of reading the canonical file
#[derive(Debug)]
pub enum LoadOutcome {
    /// File parsed
    Loaded(Value),
    /// No file at the canonical path
    Missing,
    /// File present but not well-formed JSON
    Unreadable(String),
}

/// Outcome of a write whose rename went through
///
/// The rename is the commit point, so both variants mean the canonical file
/// holds the new content.
#[derive(Debug)]
pub enum WriteOutcome {
    /// Renamed and the directory entry fsynced
    Durable,
    /// Renamed, but the directory fsync failed
    DirSyncFailed(DocumentError),
}

fn file_name(path: &Path) -> OsString {
    path.file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("document"))
}

/// Prefix of every temp file for `path`: `.<file>.`
fn temp_prefix(path: &Path) -> String {
    format!(".{}.", file_name(path).to_string_lossy())
}

/// Lock file guarding `path`: `<file>.lock` in the same directory
pub fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = file_name(path);
    name.push(".lock");
    path.with_file_name(name)
}

/// Take the exclusive lock for `path`
///
/// The lock is released when the returned file is dropped. Fails with
/// `StoreLocked` if another handle holds it.
pub fn lock_exclusive(path: &Path) -> DocumentResult<File> {
    let dir = parent_dir(path);
    fs::create_dir_all(dir)
        .map_err(|e| DocumentError::persistence_at("Failed to create directory", dir, e))?;

    let lock_path = lock_path_for(path);
    let lock_file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .read(true)
        .write(true)
        .open(&lock_path)
        .map_err(|e| DocumentError::persistence_at("Failed to open lock file", &lock_path, e))?;

    if let Err(e) = lock_file.try_lock_exclusive() {
        if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() {
            return Err(DocumentError::StoreLocked {
                path: path.display().to_string(),
            });
        }
        return Err(DocumentError::persistence_at("Failed to lock", &lock_path, e));
    }

    Ok(lock_file)
}

/// Read and parse the canonical file
pub fn load(path: &Path) -> DocumentResult<LoadOutcome> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(LoadOutcome::Missing),
        Err(e) => return Err(DocumentError::persistence_at("Failed to read", path, e)),
    };

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(value) => Ok(LoadOutcome::Loaded(value)),
        Err(e) => Ok(LoadOutcome::Unreadable(e.to_string())),
    }
}

/// Temp files for `path` currently on disk, sorted
pub fn temp_files(path: &Path) -> DocumentResult<Vec<PathBuf>> {
    let dir = parent_dir(path);
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(DocumentError::persistence_at("Failed to list", dir, e)),
    };

    let prefix = temp_prefix(path);
    let mut temps = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| DocumentError::persistence_at("Failed to list", dir, e))?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
        if is_file && name.starts_with(&prefix) && name.ends_with(TEMP_SUFFIX) {
            temps.push(entry.path());
        }
    }

    temps.sort();
    Ok(temps)
}

/// Remove temp files left by interrupted replaces
///
/// Only safe while holding the lock from `lock_exclusive`: no live writer
/// can own one of these files. Returns the removed paths.
pub fn remove_stale_temps(path: &Path) -> DocumentResult<Vec<PathBuf>> {
    let stale = temp_files(path)?;
    for temp in &stale {
        fs::remove_file(temp).map_err(|e| {
            DocumentError::persistence_at("Failed to remove stale temp file", temp, e)
        })?;
    }
    Ok(stale)
}

/// Atomically replace the canonical file with `bytes`
///
/// An error means the canonical file was not replaced.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> DocumentResult<WriteOutcome> {
    let dir = parent_dir(path);
    fs::create_dir_all(dir)
        .map_err(|e| DocumentError::persistence_at("Failed to create directory", dir, e))?;

    maybe_crash(points::DOCUMENT_BEFORE_TEMP_WRITE);

    // Dropping the temp on any error path deletes it
    let temp = write_temp(path, dir, bytes)?;

    maybe_crash(points::DOCUMENT_AFTER_TEMP_WRITE);

    temp.persist(path).map_err(|e| {
        DocumentError::persistence_at("Failed to rename temp file over", path, e.error)
    })?;

    let outcome = match fsync_dir(dir) {
        Ok(()) => WriteOutcome::Durable,
        Err(e) => WriteOutcome::DirSyncFailed(e),
    };

    maybe_crash(points::DOCUMENT_AFTER_RENAME);

    Ok(outcome)
}

fn write_temp(path: &Path, dir: &Path, bytes: &[u8]) -> DocumentResult<NamedTempFile> {
    let prefix = temp_prefix(path);
    let mut builder = Builder::new();
    builder.prefix(&prefix).suffix(TEMP_SUFFIX);

    // Temp files default to 0600; the document is an ordinary config file
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o644));
    }

    let mut temp = builder
        .tempfile_in(dir)
        .map_err(|e| DocumentError::persistence_at("Failed to create temp file in", dir, e))?;

    temp.write_all(bytes)
        .map_err(|e| DocumentError::persistence_at("Failed to write temp file", temp.path(), e))?;

    temp.as_file()
        .sync_all()
        .map_err(|e| DocumentError::persistence_at("Failed to fsync temp file", temp.path(), e))?;

    Ok(temp)
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

/// fsync a directory so the rename itself is durable
#[cfg(unix)]
fn fsync_dir(dir: &Path) -> DocumentResult<()> {
    maybe_fail(faults::DOCUMENT_DIR_SYNC)
        .map_err(|e| DocumentError::persistence_at("Failed to fsync directory", dir, e))?;

    let handle = OpenOptions::new()
        .read(true)
        .open(dir)
        .map_err(|e| DocumentError::persistence_at("Failed to open directory for fsync", dir, e))?;

    handle
        .sync_all()
        .map_err(|e| DocumentError::persistence_at("Failed to fsync directory", dir, e))
}

// Directories cannot be opened as files on this platform
#[cfg(not(unix))]
fn fsync_dir(dir: &Path) -> DocumentResult<()> {
    maybe_fail(faults::DOCUMENT_DIR_SYNC)
        .map_err(|e| DocumentError::persistence_at("Failed to fsync directory", dir, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_lock_path_is_sibling() {
        let lock = lock_path_for(Path::new("/etc/app/roles.json"));
        assert_eq!(lock, PathBuf::from("/etc/app/roles.json.lock"));
    }

    #[test]
    fn test_load_missing() {
        let dir = TempDir::new().unwrap();
        let outcome = load(&dir.path().join("roles.json")).unwrap();
        assert!(matches!(outcome, LoadOutcome::Missing));
    }

    #[test]
    fn test_load_unreadable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("roles.json");
        fs::write(&path, b"{\"roles\": [").unwrap();

        let outcome = load(&path).unwrap();
        assert!(matches!(outcome, LoadOutcome::Unreadable(_)));
    }

    #[test]
    fn test_write_atomic_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config").join("roles.json");

        let outcome = write_atomic(&path, br#"{"roles":["a"]}"#).unwrap();
        assert!(matches!(outcome, WriteOutcome::Durable));

        match load(&path).unwrap() {
            LoadOutcome::Loaded(value) => assert_eq!(value, json!({"roles": ["a"]})),
            other => panic!("expected Loaded, got {:?}", other),
        }
        assert!(temp_files(&path).unwrap().is_empty());
    }

    #[test]
    fn test_failed_rename_removes_temp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("roles.json");

        // A non-empty directory at the canonical path makes the rename fail
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), b"x").unwrap();

        let result = write_atomic(&path, b"[2]");
        assert!(matches!(result, Err(DocumentError::PersistenceFailure { .. })));
        assert!(path.is_dir());
        assert!(temp_files(&path).unwrap().is_empty());
    }

    #[test]
    fn test_remove_stale_temps_only_touches_own_temps() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("roles.json");

        assert!(remove_stale_temps(&path).unwrap().is_empty());

        let stale = dir.path().join(".roles.json.a1b2c3.tmp");
        let unrelated = [
            dir.path().join("roles.json.bak"),
            dir.path().join(".other.json.a1b2c3.tmp"),
        ];
        fs::write(&stale, b"{\"half").unwrap();
        for file in &unrelated {
            fs::write(file, b"x").unwrap();
        }

        assert_eq!(remove_stale_temps(&path).unwrap(), vec![stale.clone()]);
        assert!(!stale.exists());
        assert!(unrelated.iter().all(|f| f.exists()));
    }

    #[test]
    fn test_second_lock_is_refused_until_release() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("roles.json");

        let held = lock_exclusive(&path).unwrap();
        assert!(matches!(
            lock_exclusive(&path),
            Err(DocumentError::StoreLocked { .. })
        ));

        drop(held);
        lock_exclusive(&path).unwrap();
    }
}
