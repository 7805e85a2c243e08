//! Filtered, paginated log queries
//!
//! A query is a full scan of the day files whose date falls in the requested
//! range. Cost follows on-disk volume, not result size.

use chrono::{DateTime, Duration, Local};

use super::day_file::{list_day_files, DayFile};
use super::error::AuditResult;
use super::reader::scan_files;
use super::AuditLogConfig;
use crate::types::{
    LogEntry, LogQueryParams, LogQueryResult, DEFAULT_PAGE_SIZE, DEFAULT_QUERY_DAYS,
};

/// Query parameters with every default applied
#[derive(Debug, Clone)]
struct ResolvedQuery {
    start: DateTime<Local>,
    end: DateTime<Local>,
    page: i64,
    page_size: i64,
}

impl ResolvedQuery {
    fn resolve(params: &LogQueryParams, now: DateTime<Local>) -> Self {
        let end = params.end_date.unwrap_or(now);
        let start = params
            .start_date
            .unwrap_or_else(|| end - Duration::days(DEFAULT_QUERY_DAYS));
        let page = if params.page > 0 { params.page } else { 1 };
        let page_size = if params.page_size > 0 {
            params.page_size
        } else {
            DEFAULT_PAGE_SIZE
        };

        Self {
            start,
            end,
            page,
            page_size,
        }
    }

    /// Day files whose calendar date lies in `[date(start), date(end)]`
    fn selects(&self, file: &DayFile) -> bool {
        file.date >= self.start.date_naive() && file.date <= self.end.date_naive()
    }

    /// `[start, end)` slice bounds of the requested page within `len` results
    fn window(&self, len: usize) -> (usize, usize) {
        let offset = (self.page - 1).saturating_mul(self.page_size);
        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(len);
        let size = usize::try_from(self.page_size).unwrap_or(usize::MAX);
        (start, start.saturating_add(size).min(len))
    }
}

/// Check an entry against the time range and every non-empty filter
fn matches(entry: &LogEntry, query: &ResolvedQuery, params: &LogQueryParams) -> bool {
    if entry.timestamp < query.start || entry.timestamp > query.end {
        return false;
    }

    let field_matches = |filter: &str, value: &str| filter.is_empty() || filter == value;

    field_matches(&params.level, entry.level.as_str())
        && field_matches(&params.log_type, entry.log_type.as_str())
        && field_matches(&params.ip, &entry.ip)
        && field_matches(&params.action, &entry.action)
        && field_matches(&params.file, &entry.file)
}

/// Run a query as of `now`
pub fn query_logs(
    config: &AuditLogConfig,
    params: &LogQueryParams,
    now: DateTime<Local>,
) -> AuditResult<LogQueryResult> {
    let query = ResolvedQuery::resolve(params, now);

    // Newest day first; only a locality hint, the real order is the sort below
    let mut candidates: Vec<DayFile> = list_day_files(config.log_dir())?
        .into_iter()
        .filter(|f| query.selects(f))
        .collect();
    candidates.reverse();

    let (per_file, scan) = scan_files(&candidates, |entries| {
        entries
            .into_iter()
            .filter(|e| matches(e, &query, params))
            .collect::<Vec<_>>()
    });

    let mut matched: Vec<LogEntry> = per_file.into_iter().flatten().collect();
    matched.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let total = matched.len() as u64;
    let (start, end) = query.window(matched.len());
    let logs: Vec<LogEntry> = matched.drain(start..end).collect();

    tracing::debug!(
        files = candidates.len(),
        total,
        returned = logs.len(),
        skipped = scan.lines_skipped,
        "log query finished"
    );

    Ok(LogQueryResult {
        total,
        page: query.page,
        page_size: query.page_size,
        logs,
        scan,
    })
}
