//! Administrator-triggered retention sweep
//!
//! Nothing in this crate schedules a sweep; callers decide when day files go.

use std::fs;

use chrono::{Duration, NaiveDate};

use super::day_file::list_day_files;
use super::error::AuditResult;
use super::AuditLogConfig;
use crate::types::SweepReport;

/// Retention used when the caller passes a non-positive number of days
pub const DEFAULT_RETENTION_DAYS: i64 = 7;

/// Upper bound keeping the cutoff arithmetic in range
const MAX_RETENTION_DAYS: i64 = 1_000_000;

/// Delete every day file dated strictly before `today - retention_days`
///
/// Individual delete failures are logged and counted, never fatal.
pub fn sweep(
    config: &AuditLogConfig,
    retention_days: i64,
    today: NaiveDate,
) -> AuditResult<SweepReport> {
    let days = if retention_days <= 0 {
        DEFAULT_RETENTION_DAYS
    } else {
        retention_days.min(MAX_RETENTION_DAYS)
    };
    let cutoff = today
        .checked_sub_signed(Duration::days(days))
        .unwrap_or(NaiveDate::MIN);

    let mut report = SweepReport::default();

    for file in list_day_files(config.log_dir())? {
        if file.date >= cutoff {
            continue;
        }

        match fs::remove_file(&file.path) {
            Ok(()) => {
                report.deleted_count += 1;
                tracing::debug!(path = %file.path.display(), "deleted expired log file");
            }
            Err(e) => {
                report.failed_count += 1;
                tracing::warn!(
                    path = %file.path.display(),
                    error = %e,
                    "failed to delete log file"
                );
            }
        }
    }

    tracing::info!(
        days,
        %cutoff,
        deleted = report.deleted_count,
        failed = report.failed_count,
        "log retention sweep finished"
    );

    Ok(report)
}
