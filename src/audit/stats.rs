//! Aggregate statistics over every day file

use std::collections::BTreeMap;

use super::day_file::list_day_files;
use super::error::AuditResult;
use super::reader::scan_files;
use super::AuditLogConfig;
use crate::types::{LogEntry, LogStats};

fn bump(map: &mut BTreeMap<String, u64>, key: &str) {
    match map.get_mut(key) {
        Some(count) => *count += 1,
        None => {
            map.insert(key.to_string(), 1);
        }
    }
}

fn merge_counts(into: &mut BTreeMap<String, u64>, from: BTreeMap<String, u64>) {
    for (key, count) in from {
        *into.entry(key).or_insert(0) += count;
    }
}

/// Count one file's entries
fn tally(entries: Vec<LogEntry>) -> LogStats {
    let mut stats = LogStats::default();

    for entry in &entries {
        stats.total_logs += 1;
        bump(&mut stats.type_stats, entry.log_type.as_str());
        bump(&mut stats.ip_stats, &entry.ip);
        bump(&mut stats.action_stats, &entry.action);
        bump(
            &mut stats.daily_stats,
            &entry.timestamp.format("%Y-%m-%d").to_string(),
        );
    }

    stats
}

/// Collect statistics across the whole log directory
pub fn collect_stats(config: &AuditLogConfig) -> AuditResult<LogStats> {
    let files = list_day_files(config.log_dir())?;
    let (partials, scan) = scan_files(&files, tally);

    let mut stats = LogStats {
        scan,
        ..Default::default()
    };

    for partial in partials {
        stats.total_logs += partial.total_logs;
        merge_counts(&mut stats.type_stats, partial.type_stats);
        merge_counts(&mut stats.ip_stats, partial.ip_stats);
        merge_counts(&mut stats.action_stats, partial.action_stats);
        merge_counts(&mut stats.daily_stats, partial.daily_stats);
    }

    Ok(stats)
}
