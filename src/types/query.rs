//! Query and statistics structures for the audit log

use std::collections::BTreeMap;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::LogEntry;

/// Default page size for log queries
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Default look-back window for log queries, in days
pub const DEFAULT_QUERY_DAYS: i64 = 7;

/// Filters and pagination for a log query
///
/// Empty string filters mean "no constraint". Non-empty filters must match
/// the entry's label exactly (case-sensitive).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogQueryParams {
    /// Inclusive lower bound (default: `end_date - 7 days`)
    #[serde(default)]
    pub start_date: Option<DateTime<Local>>,
    /// Inclusive upper bound (default: now)
    #[serde(default)]
    pub end_date: Option<DateTime<Local>>,
    #[serde(default)]
    pub level: String,
    #[serde(default, rename = "type")]
    pub log_type: String,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub file: String,
    /// 1-based page number; non-positive resets to 1
    #[serde(default)]
    pub page: i64,
    /// Non-positive resets to 20
    #[serde(default)]
    pub page_size: i64,
}

impl LogQueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn between(mut self, start: DateTime<Local>, end: DateTime<Local>) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = ip.into();
        self
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_type(mut self, log_type: impl Into<String>) -> Self {
        self.log_type = log_type.into();
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = action.into();
        self
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = file.into();
        self
    }

    pub fn with_page(mut self, page: i64, page_size: i64) -> Self {
        self.page = page;
        self.page_size = page_size;
        self
    }
}

/// Lenient-scan bookkeeping: what was read and what was dropped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    /// Day files successfully read
    pub files_scanned: u64,
    /// Day files that matched but could not be read
    pub files_unreadable: u64,
    /// Non-empty lines that failed to parse
    pub lines_skipped: u64,
}

impl ScanReport {
    pub fn merge(&mut self, other: ScanReport) {
        self.files_scanned += other.files_scanned;
        self.files_unreadable += other.files_unreadable;
        self.lines_skipped += other.lines_skipped;
    }
}

/// One page of query results
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogQueryResult {
    /// Number of matching entries before pagination
    pub total: u64,
    pub page: i64,
    pub page_size: i64,
    pub logs: Vec<LogEntry>,
    #[serde(default)]
    pub scan: ScanReport,
}

/// Aggregate counts over every day file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogStats {
    pub total_logs: u64,
    pub type_stats: BTreeMap<String, u64>,
    pub ip_stats: BTreeMap<String, u64>,
    pub action_stats: BTreeMap<String, u64>,
    /// Keyed by `YYYY-MM-DD`
    pub daily_stats: BTreeMap<String, u64>,
    #[serde(default)]
    pub scan: ScanReport,
}

/// Outcome of a retention sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub deleted_count: u64,
    pub failed_count: u64,
}
