//! Data types for the telemetry core
//!
//! This module contains the records written to disk and the transient
//! query/response structures shared by the audit log, the metrics history
//! and the HTTP API.

mod log_entry;
mod metrics;
mod query;

pub use log_entry::{LogEntry, LogLevel, LogType, ParseLevelError};
pub use metrics::{percent, CpuInfo, DataPoint, DiskInfo, MemoryInfo, SystemInfo};
pub use query::{
    LogQueryParams, LogQueryResult, LogStats, ScanReport, SweepReport, DEFAULT_PAGE_SIZE,
    DEFAULT_QUERY_DAYS,
};

/// Check if value is zero (for skip_serializing_if)
pub fn is_zero(val: &u64) -> bool {
    *val == 0
}
