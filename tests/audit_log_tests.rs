//! Audit Log Integration Tests
//!
//! Tests for the complete audit flow including:
//! - Level threshold filtering
//! - Record then query round trips across day files
//! - Pagination and ordering
//! - Statistics and retention sweeps

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Local, NaiveDate, TimeZone};

use ops_telemetry::audit::{day_file_name, list_day_files, AuditLog, AuditLogConfig};
use ops_telemetry::types::{LogEntry, LogLevel, LogQueryParams, LogType};

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

fn test_log_dir() -> PathBuf {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    PathBuf::from(format!(
        "target/test_audit_log_{}_{}",
        std::process::id(),
        id
    ))
}

fn cleanup_dir(path: &Path) {
    let _ = fs::remove_dir_all(path);
}

fn at(day: u32, hour: u32, minute: u32) -> DateTime<Local> {
    Local.with_ymd_and_hms(2025, 1, day, hour, minute, 0).unwrap()
}

fn entry(level: LogLevel, log_type: LogType, ip: &str, action: &str) -> LogEntry {
    LogEntry::new(level, log_type, ip, "integration", action, "")
}

/// Write entries straight into the day files their timestamps belong to
fn seed(dir: &Path, entries: &[LogEntry]) {
    fs::create_dir_all(dir).unwrap();
    for e in entries {
        let path = dir.join(day_file_name(e.timestamp.date_naive()));
        let mut file = OpenOptions::new().create(true).append(true).open(path).unwrap();
        writeln!(file, "{}", e.to_json_line().unwrap()).unwrap();
    }
}

fn count_lines(dir: &Path) -> usize {
    list_day_files(dir)
        .unwrap()
        .iter()
        .map(|f| fs::read_to_string(&f.path).unwrap().lines().count())
        .sum()
}

#[test]
fn test_only_levels_at_or_above_threshold_persist() {
    let levels = [
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Fatal,
    ];

    for (i, threshold) in levels.iter().enumerate() {
        let dir = test_log_dir();
        let log = AuditLog::new(AuditLogConfig::new(&dir).with_min_level(*threshold));

        for level in levels {
            log.record(level, LogType::System, "", "", "heartbeat", "", None, None)
                .unwrap();
        }

        assert_eq!(count_lines(&dir), levels.len() - i, "threshold {}", threshold);
        cleanup_dir(&dir);
    }
}

#[test]
fn test_record_then_query_round_trip() {
    let dir = test_log_dir();
    let written = entry(LogLevel::Info, LogType::File, "10.0.0.2", "upload")
        .with_file("reports/q1.pdf", 2048)
        .at(at(10, 12, 0));
    seed(&dir, &[written.clone()]);
    let log = AuditLog::new(AuditLogConfig::new(&dir));

    let result = log
        .query(&LogQueryParams::new().between(at(10, 0, 0), at(10, 23, 59)))
        .unwrap();

    assert_eq!(result.total, 1);
    assert_eq!(result.logs[0], written);

    cleanup_dir(&dir);
}

#[test]
fn test_day_files_listed_in_date_order() {
    let dir = test_log_dir();
    seed(
        &dir,
        &[
            entry(LogLevel::Info, LogType::User, "", "b").at(at(10, 0, 1)),
            entry(LogLevel::Info, LogType::User, "", "a").at(at(9, 23, 59)),
        ],
    );
    fs::write(dir.join("notes.txt"), "not a day file").unwrap();

    let dates: Vec<NaiveDate> = list_day_files(&dir).unwrap().iter().map(|f| f.date).collect();
    assert_eq!(
        dates,
        vec![
            NaiveDate::from_ymd_opt(2025, 1, 9).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
        ]
    );

    cleanup_dir(&dir);
}

#[test]
fn test_start_day_file_is_scanned() {
    let dir = test_log_dir();
    seed(
        &dir,
        &[
            entry(LogLevel::Info, LogType::User, "", "early").at(at(10, 8, 0)),
            entry(LogLevel::Info, LogType::User, "", "late").at(at(10, 18, 0)),
            entry(LogLevel::Info, LogType::User, "", "next").at(at(11, 9, 0)),
        ],
    );
    let log = AuditLog::new(AuditLogConfig::new(&dir));

    // Range starts mid-day; the day's file must still be read
    let result = log
        .query(&LogQueryParams::new().between(at(10, 12, 0), at(11, 12, 0)))
        .unwrap();

    let actions: Vec<&str> = result.logs.iter().map(|e| e.action.as_str()).collect();
    assert_eq!(actions, vec!["next", "late"]);

    cleanup_dir(&dir);
}

#[test]
fn test_pagination_is_complete_and_disjoint() {
    let dir = test_log_dir();
    let entries: Vec<LogEntry> = (0..45u32)
        .map(|i| {
            let ts = at(10 + i / 20, 8, i % 20);
            entry(LogLevel::Info, LogType::Access, "", &format!("req-{}", i)).at(ts)
        })
        .collect();
    seed(&dir, &entries);
    let log = AuditLog::new(AuditLogConfig::new(&dir));

    let range = LogQueryParams::new().between(at(1, 0, 0), at(31, 0, 0));
    let mut seen = HashSet::new();
    let mut previous: Option<DateTime<Local>> = None;

    for page in 1..=3 {
        let result = log.query(&range.clone().with_page(page, 20)).unwrap();
        assert_eq!(result.total, 45);

        for e in &result.logs {
            if let Some(prev) = previous {
                assert!(e.timestamp <= prev, "results must be newest first");
            }
            previous = Some(e.timestamp);
            assert!(seen.insert(e.action.clone()), "duplicate {}", e.action);
        }
    }
    assert_eq!(seen.len(), 45);

    let past_end = log.query(&range.with_page(4, 20)).unwrap();
    assert_eq!(past_end.total, 45);
    assert!(past_end.logs.is_empty());

    cleanup_dir(&dir);
}

#[test]
fn test_filters_are_exact_labels() {
    let dir = test_log_dir();
    seed(
        &dir,
        &[
            entry(LogLevel::Warn, LogType::Error, "1.1.1.1", "x").at(at(10, 9, 0)),
            entry(LogLevel::Info, LogType::User, "1.1.1.1", "y").at(at(10, 9, 5)),
        ],
    );
    let log = AuditLog::new(AuditLogConfig::new(&dir));

    let range = LogQueryParams::new().between(at(10, 0, 0), at(10, 23, 0));

    assert_eq!(log.query(&range.clone().with_level("WARN")).unwrap().total, 1);
    assert_eq!(log.query(&range.clone().with_type("USER")).unwrap().total, 1);
    assert_eq!(log.query(&range.clone().with_type("user")).unwrap().total, 0);
    assert_eq!(log.query(&range.with_level("VERBOSE")).unwrap().total, 0);

    cleanup_dir(&dir);
}

#[test]
fn test_malformed_lines_are_skipped_and_counted() {
    let dir = test_log_dir();
    seed(&dir, &[entry(LogLevel::Info, LogType::User, "", "ok").at(at(10, 9, 0))]);
    let log = AuditLog::new(AuditLogConfig::new(&dir));
    let path = log
        .config()
        .day_file_path(NaiveDate::from_ymd_opt(2025, 1, 10).unwrap());
    let mut content = fs::read_to_string(&path).unwrap();
    content.push_str("{\"timestamp\": \"truncated\n");
    fs::write(&path, content).unwrap();

    let result = log
        .query(&LogQueryParams::new().between(at(10, 0, 0), at(10, 23, 0)))
        .unwrap();
    assert_eq!(result.total, 1);
    assert_eq!(result.scan.lines_skipped, 1);

    let stats = log.stats().unwrap();
    assert_eq!(stats.total_logs, 1);
    assert_eq!(stats.scan.lines_skipped, 1);

    cleanup_dir(&dir);
}

#[test]
fn test_missing_directory_is_empty_state() {
    let dir = test_log_dir();
    let log = AuditLog::new(AuditLogConfig::new(&dir));

    assert_eq!(log.query(&LogQueryParams::new()).unwrap().total, 0);
    assert_eq!(log.stats().unwrap().total_logs, 0);
    assert_eq!(log.sweep(7).unwrap(), 0);
}

#[test]
fn test_sweep_scenario_and_idempotence() {
    let dir = test_log_dir();
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("logs_20250101.log"), "").unwrap();
    fs::write(dir.join("logs_20250110.log"), "").unwrap();

    let log = AuditLog::new(AuditLogConfig::new(&dir));
    let today = NaiveDate::from_ymd_opt(2025, 1, 12).unwrap();

    let first = log.sweep_as_of(7, today).unwrap();
    assert_eq!(first.deleted_count, 1);
    assert!(!dir.join("logs_20250101.log").exists());
    assert!(dir.join("logs_20250110.log").exists());

    let second = log.sweep_as_of(7, today).unwrap();
    assert_eq!(second.deleted_count, 0);

    cleanup_dir(&dir);
}
