//! Audit Log - day-partitioned append-only event log
//!
//! This module provides the audit trail of the server:
//! - `AuditLog`: the service object; serialized, day-rotating writes
//! - `query`: filtered, paginated reads over a date range
//! - `stats`: count breakdowns over every day file
//! - `retention`: administrator-triggered deletion of old day files
//!
//! # Architecture
//!
//! ```text
//! Write Path:
//! ┌─────────┐    ┌────────────────┐    ┌───────────────────┐    ┌─────────────────────┐
//! │ request │───►│ level >= min ? │───►│ rotate if the day │───►│ append JSON line to │
//! │ handler │    │ (else no-op)   │    │ changed (locked)  │    │ logs_YYYYMMDD.log   │
//! └─────────┘    └────────────────┘    └───────────────────┘    └─────────────────────┘
//!
//! Read Path (on demand):
//! ┌──────────────────┐    ┌──────────────────────┐    ┌──────────────────────┐
//! │ list day files   │───►│ parse lines, skip    │───►│ filter, sort, page / │
//! │ (date from name) │    │ malformed ones       │    │ count / delete       │
//! └──────────────────┘    └──────────────────────┘    └──────────────────────┘
//! ```

mod day_file;
mod error;
mod reader;
mod writer;

pub mod query;
pub mod retention;
pub mod stats;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDate};
use parking_lot::Mutex;

use crate::types::{
    LogEntry, LogLevel, LogQueryParams, LogQueryResult, LogStats, LogType, SweepReport,
};

pub use day_file::{day_file_name, list_day_files, parse_day_file_name, DayFile};
pub use error::{AuditError, AuditResult};
pub use retention::DEFAULT_RETENTION_DAYS;

use writer::DayWriter;

/// Configuration for the AuditLog
#[derive(Debug, Clone)]
pub struct AuditLogConfig {
    /// Directory holding the day files
    pub log_dir: PathBuf,
    /// Entries below this level are dropped
    pub min_level: LogLevel,
}

impl Default for AuditLogConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs"),
            min_level: LogLevel::Info,
        }
    }
}

impl AuditLogConfig {
    /// Create config with custom log directory
    pub fn new<P: AsRef<Path>>(log_dir: P) -> Self {
        Self {
            log_dir: log_dir.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    /// Set the minimum level that gets persisted
    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Get the log directory path
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Path of the day file for `date`
    pub fn day_file_path(&self, date: NaiveDate) -> PathBuf {
        self.log_dir.join(day_file_name(date))
    }
}

/// The audit log service
///
/// Shared by reference (usually behind an `Arc`) between every request
/// handler. All writes go through one mutex covering rotation and append.
pub struct AuditLog {
    config: AuditLogConfig,
    writer: Mutex<DayWriter>,
}

impl AuditLog {
    /// Create an audit log; no file is opened until the first write
    pub fn new(config: AuditLogConfig) -> Self {
        Self {
            config,
            writer: Mutex::new(DayWriter::new()),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &AuditLogConfig {
        &self.config
    }

    /// Whether an entry at `level` would be persisted
    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.config.min_level
    }

    /// Append a pre-built entry to the day file of its own timestamp
    ///
    /// Entries below the configured threshold are dropped and reported as
    /// success. Callers outside the crate go through `record` so only the
    /// current day's file is ever appended.
    pub(crate) fn append(&self, entry: LogEntry) -> AuditResult<()> {
        if !self.enabled(entry.level) {
            return Ok(());
        }

        self.writer.lock().write(&self.config.log_dir, &entry)
    }

    /// Record an event stamped with the current time
    ///
    /// Never terminates the process, even at `Fatal`; see [`AuditLog::fatal`].
    #[allow(clippy::too_many_arguments)]
    pub fn record(
        &self,
        level: LogLevel,
        log_type: LogType,
        ip: &str,
        user_agent: &str,
        action: &str,
        details: &str,
        file: Option<&str>,
        size: Option<u64>,
    ) -> AuditResult<()> {
        if !self.enabled(level) {
            return Ok(());
        }

        let mut entry = LogEntry::new(level, log_type, ip, user_agent, action, details);
        if let Some(file) = file {
            entry.file = file.to_string();
        }
        entry.size = size.unwrap_or(0);

        self.append(entry)
    }

    pub fn debug(
        &self,
        log_type: LogType,
        ip: &str,
        ua: &str,
        action: &str,
        details: &str,
    ) -> AuditResult<()> {
        self.record(LogLevel::Debug, log_type, ip, ua, action, details, None, None)
    }

    pub fn info(
        &self,
        log_type: LogType,
        ip: &str,
        ua: &str,
        action: &str,
        details: &str,
    ) -> AuditResult<()> {
        self.record(LogLevel::Info, log_type, ip, ua, action, details, None, None)
    }

    pub fn warn(
        &self,
        log_type: LogType,
        ip: &str,
        ua: &str,
        action: &str,
        details: &str,
    ) -> AuditResult<()> {
        self.record(LogLevel::Warn, log_type, ip, ua, action, details, None, None)
    }

    pub fn error(
        &self,
        log_type: LogType,
        ip: &str,
        ua: &str,
        action: &str,
        details: &str,
    ) -> AuditResult<()> {
        self.record(LogLevel::Error, log_type, ip, ua, action, details, None, None)
    }

    /// Record a `Fatal` entry, then exit the process with status 1
    ///
    /// The exit happens whether or not the write succeeded.
    pub fn fatal(
        &self,
        log_type: LogType,
        ip: &str,
        ua: &str,
        action: &str,
        details: &str,
    ) -> ! {
        let written = self.record(LogLevel::Fatal, log_type, ip, ua, action, details, None, None);
        if let Err(e) = written {
            tracing::error!(error = %e, action, "failed to persist fatal audit entry");
        }
        std::process::exit(1)
    }

    /// INFO/FILE entry for an operation on a user file
    pub fn log_file_operation(
        &self,
        ip: &str,
        ua: &str,
        action: &str,
        file: &str,
        size: u64,
    ) -> AuditResult<()> {
        self.record(
            LogLevel::Info,
            LogType::File,
            ip,
            ua,
            action,
            "",
            Some(file),
            Some(size),
        )
    }

    /// INFO/USER entry
    pub fn log_user_operation(
        &self,
        ip: &str,
        ua: &str,
        action: &str,
        details: &str,
    ) -> AuditResult<()> {
        self.info(LogType::User, ip, ua, action, details)
    }

    /// INFO/SYSTEM entry
    pub fn log_system_operation(
        &self,
        ip: &str,
        ua: &str,
        action: &str,
        details: &str,
    ) -> AuditResult<()> {
        self.info(LogType::System, ip, ua, action, details)
    }

    /// INFO/ACCESS entry
    pub fn log_access(&self, ip: &str, ua: &str, action: &str, details: &str) -> AuditResult<()> {
        self.info(LogType::Access, ip, ua, action, details)
    }

    /// ERROR/ERROR entry
    pub fn log_error(&self, ip: &str, ua: &str, action: &str, details: &str) -> AuditResult<()> {
        self.error(LogType::Error, ip, ua, action, details)
    }
}

// Read-side operations (stateless scans, see submodules)
impl AuditLog {
    pub fn query(&self, params: &LogQueryParams) -> AuditResult<LogQueryResult> {
        query::query_logs(&self.config, params, Local::now())
    }

    /// Query as of an explicit "now" (drives the default date range)
    pub fn query_at(
        &self,
        params: &LogQueryParams,
        now: DateTime<Local>,
    ) -> AuditResult<LogQueryResult> {
        query::query_logs(&self.config, params, now)
    }

    pub fn stats(&self) -> AuditResult<LogStats> {
        stats::collect_stats(&self.config)
    }

    /// Delete day files older than `retention_days`; returns how many went
    pub fn sweep(&self, retention_days: i64) -> AuditResult<u64> {
        Ok(self.sweep_report(retention_days)?.deleted_count)
    }

    pub fn sweep_report(&self, retention_days: i64) -> AuditResult<SweepReport> {
        self.sweep_as_of(retention_days, Local::now().date_naive())
    }

    pub fn sweep_as_of(&self, retention_days: i64, today: NaiveDate) -> AuditResult<SweepReport> {
        retention::sweep(&self.config, retention_days, today)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs;
    use std::process::Command;
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    fn create_test_log(min_level: LogLevel) -> (AuditLog, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config = AuditLogConfig::new(temp_dir.path().join("logs")).with_min_level(min_level);
        (AuditLog::new(config), temp_dir)
    }

    fn today_lines(log: &AuditLog) -> Vec<String> {
        let path = log.config().day_file_path(Local::now().date_naive());
        fs::read_to_string(path)
            .unwrap_or_default()
            .lines()
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_threshold_filters_silently() {
        let (log, _temp_dir) = create_test_log(LogLevel::Warn);

        log.debug(LogType::System, "", "", "debug", "").unwrap();
        log.info(LogType::System, "", "", "info", "").unwrap();
        log.warn(LogType::System, "", "", "warn", "").unwrap();
        log.error(LogType::System, "", "", "error", "").unwrap();

        let lines = today_lines(&log);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"action\":\"warn\""));
        assert!(lines[1].contains("\"action\":\"error\""));
    }

    #[test]
    fn test_record_with_file() {
        let (log, _temp_dir) = create_test_log(LogLevel::Info);

        log.log_file_operation("1.2.3.4", "curl", "upload", "docs/a.txt", 1024)
            .unwrap();

        let lines = today_lines(&log);
        let entry = LogEntry::from_json_line(&lines[0]).unwrap();
        assert_eq!(entry.log_type, LogType::File);
        assert_eq!(entry.file, "docs/a.txt");
        assert_eq!(entry.size, 1024);
    }

    #[test]
    fn test_log_error_uses_error_type_and_level() {
        let (log, _temp_dir) = create_test_log(LogLevel::Info);

        log.log_error("", "", "login failed", "bad password").unwrap();

        let entry = LogEntry::from_json_line(&today_lines(&log)[0]).unwrap();
        assert_eq!(entry.level, LogLevel::Error);
        assert_eq!(entry.log_type, LogType::Error);
    }

    #[test]
    fn test_concurrent_writes_do_not_interleave() {
        let (log, _temp_dir) = create_test_log(LogLevel::Info);
        let log = Arc::new(log);

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let log = Arc::clone(&log);
                thread::spawn(move || {
                    for i in 0..50 {
                        log.log_access("10.0.0.1", "ua", &format!("t{}-{}", t, i), "")
                            .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let mut total = 0;
        for file in list_day_files(log.config().log_dir()).unwrap() {
            for line in fs::read_to_string(&file.path).unwrap().lines() {
                LogEntry::from_json_line(line).unwrap();
                total += 1;
            }
        }
        assert_eq!(total, 400);
    }

    #[test]
    fn test_record_then_query() {
        let (log, _temp_dir) = create_test_log(LogLevel::Info);

        log.log_user_operation("1.2.3.4", "ua", "login", "ok").unwrap();
        log.log_system_operation("5.6.7.8", "ua", "cleanup", "ok").unwrap();

        let result = log.query(&LogQueryParams::new().with_ip("1.2.3.4")).unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(result.logs[0].log_type, LogType::User);
    }

    #[test]
    fn test_write_after_sweep_recreates_day_file() {
        let (log, _temp_dir) = create_test_log(LogLevel::Info);
        let day = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let at = |action: &str| {
            LogEntry::new(LogLevel::Info, LogType::System, "", "", action, "")
                .at(Local.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap())
        };

        log.append(at("before")).unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 1, 12).unwrap();
        let report = log.sweep_as_of(7, today).unwrap();
        assert_eq!(report.deleted_count, 1);

        log.append(at("after")).unwrap();

        let content = fs::read_to_string(log.config().day_file_path(day)).unwrap();
        let entry = LogEntry::from_json_line(content.trim()).unwrap();
        assert_eq!(entry.action, "after");
    }

    const FATAL_LOG_DIR_ENV: &str = "OPS_TELEMETRY_FATAL_LOG_DIR";

    /// Re-run `test_name` in a child process with the fatal log dir set
    fn run_fatal_child(test_name: &str, log_dir: &Path) -> std::process::Output {
        Command::new(std::env::current_exe().unwrap())
            .args(["--exact", test_name, "--nocapture", "--test-threads=1"])
            .env(FATAL_LOG_DIR_ENV, log_dir)
            .output()
            .unwrap()
    }

    fn fatal_in_child_process() {
        if let Ok(dir) = std::env::var(FATAL_LOG_DIR_ENV) {
            let log = AuditLog::new(AuditLogConfig::new(dir));
            log.fatal(LogType::System, "1.2.3.4", "ua", "disk gone", "cannot continue");
        }
    }

    #[test]
    fn test_fatal_writes_then_exits() {
        fatal_in_child_process();

        let temp_dir = TempDir::new().unwrap();
        let log_dir = temp_dir.path().join("logs");
        let output = run_fatal_child("audit::tests::test_fatal_writes_then_exits", &log_dir);

        assert_eq!(output.status.code(), Some(1));

        let files = list_day_files(&log_dir).unwrap();
        assert_eq!(files.len(), 1);
        let content = fs::read_to_string(&files[0].path).unwrap();
        let entry = LogEntry::from_json_line(content.trim()).unwrap();
        assert_eq!(entry.level, LogLevel::Fatal);
        assert_eq!(entry.action, "disk gone");
    }

    #[test]
    fn test_fatal_exits_even_when_write_fails() {
        fatal_in_child_process();

        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("not_a_dir");
        fs::write(&blocker, "file in the way").unwrap();
        let output = run_fatal_child(
            "audit::tests::test_fatal_exits_even_when_write_fails",
            &blocker.join("logs"),
        );

        assert_eq!(output.status.code(), Some(1));
        assert_eq!(fs::read_to_string(&blocker).unwrap(), "file in the way");
    }
}
