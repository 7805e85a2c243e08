//! Time and timestamp utilities

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone};

/// Date format embedded in day file names
pub const DAY_FILE_DATE_FORMAT: &str = "%Y%m%d";

/// Human-readable local time format used in snapshots
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Get current Unix timestamp in seconds
pub fn current_timestamp() -> i64 {
    Local::now().timestamp()
}

/// Format a local time as `YYYY-MM-DD HH:MM:SS`
pub fn format_display(time: &DateTime<Local>) -> String {
    time.format(DISPLAY_FORMAT).to_string()
}

/// Resolve a naive local date/time, picking the earliest instant on a DST
/// overlap and skipping forward an hour when it falls into a gap
pub fn resolve_local(date: NaiveDate, time: NaiveTime) -> DateTime<Local> {
    let naive = date.and_time(time);
    Local
        .from_local_datetime(&naive)
        .earliest()
        .or_else(|| {
            Local
                .from_local_datetime(&(naive + Duration::hours(1)))
                .earliest()
        })
        .unwrap_or_else(|| Local.from_utc_datetime(&naive))
}

/// Next occurrence of `hour:00` local time strictly after `now`
///
/// Recomputed from the wall clock on every call, so clock drift or a
/// suspended host only delays the following run.
pub fn next_daily_run(now: DateTime<Local>, hour: u32) -> DateTime<Local> {
    let at = NaiveTime::from_hms_opt(hour.min(23), 0, 0).unwrap_or_default();
    let today = resolve_local(now.date_naive(), at);

    if today > now {
        return today;
    }

    let tomorrow = now.date_naive().succ_opt().unwrap_or(now.date_naive());
    resolve_local(tomorrow, at)
}
