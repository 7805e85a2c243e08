//! Audit log error types

use std::io;
use std::path::PathBuf;

/// Result type for audit log operations
pub type AuditResult<T> = Result<T, AuditError>;

/// Errors surfaced by the audit log
///
/// Per-line and per-file problems during scans are never errors; they are
/// counted in a `ScanReport` instead.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("failed to create log directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("failed to open log file {path}: {source}")]
    OpenFile { path: PathBuf, source: io::Error },

    #[error("failed to serialize log entry: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write log file {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to read log directory {path}: {source}")]
    ReadDir { path: PathBuf, source: io::Error },
}
