//! Metrics error types

use crate::utils::atomic::AtomicError;

/// Result type for metrics operations
pub type MetricsResult<T> = Result<T, MetricsError>;

/// Errors surfaced by the metrics history
///
/// Loading never fails: a missing or unreadable history file starts empty.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("failed to persist metrics history: {0}")]
    Persist(#[from] AtomicError),

    #[error("metrics task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
