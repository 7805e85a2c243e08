//! Atomic file operations
//!
//! This module provides utilities for atomic file writes so a crash never
//! leaves a truncated persistence file behind.
//!
//! # Pattern
//!
//! 1. Write to a temporary file (.tmp) next to the destination
//! 2. Call sync_all() to flush to disk
//! 3. Rename temp file to final path (atomic on most filesystems)
//!
//! The final file is either the old version or the new version, never a
//! partial one.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Result type for atomic operations
pub type AtomicResult<T> = Result<T, AtomicError>;

/// Errors that can occur during atomic operations
#[derive(Debug, thiserror::Error)]
pub enum AtomicError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Path of the temporary sibling used while writing `path`
///
/// `.tmp` is appended to the full file name, so the temp path never equals
/// `path` and files differing only by extension never share one.
pub fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Atomically write content to a file
///
/// # Example
///
/// ```ignore
/// atomic_write("system/history.json", "[]")?;
/// ```
pub fn atomic_write<P: AsRef<Path>>(path: P, content: &str) -> AtomicResult<()> {
    atomic_write_with(path, |file| file.write_all(content.as_bytes()))
}

/// Atomically write content using a writer function
///
/// More efficient for large files as it doesn't require building the entire
/// content string in memory first.
pub fn atomic_write_with<P, F>(path: P, write_fn: F) -> AtomicResult<()>
where
    P: AsRef<Path>,
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let path = path.as_ref();
    let temp_path = temp_path_for(path);

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut file = File::create(&temp_path)?;
    let written = write_fn(&mut file).and_then(|_| file.sync_all());
    drop(file);

    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }

    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Atomically write `value` as pretty-printed JSON
pub fn atomic_write_json<P, T>(path: P, value: &T) -> AtomicResult<()>
where
    P: AsRef<Path>,
    T: Serialize + ?Sized,
{
    atomic_write_with(path, |file| {
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.flush()
    })
}

/// Remove a temp file left behind by an interrupted write of `path`
///
/// Returns whether a stale file was found and removed.
pub fn cleanup_temp_file<P: AsRef<Path>>(path: P) -> AtomicResult<bool> {
    let temp_path = temp_path_for(path.as_ref());

    if !temp_path.exists() {
        return Ok(false);
    }

    fs::remove_file(&temp_path)?;
    Ok(true)
}
