//! Lenient day file reader
//!
//! Day files are plain append logs. A crash or a concurrent writer can leave
//! a partial trailing line, so every line that fails to parse is skipped and
//! counted instead of failing the scan.

use std::fs;
use std::path::Path;

use rayon::prelude::*;

use super::day_file::DayFile;
use crate::types::{LogEntry, ScanReport};

/// Number of files from which scans run in parallel
const PARALLEL_SCAN_THRESHOLD: usize = 4;

/// Parse every line of one day file
pub(crate) fn read_day_file(path: &Path) -> (Vec<LogEntry>, ScanReport) {
    let mut report = ScanReport::default();

    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "skipping unreadable log file");
            report.files_unreadable = 1;
            return (Vec::new(), report);
        }
    };
    report.files_scanned = 1;

    // A torn multi-byte sequence only damages its own line
    let content = String::from_utf8_lossy(&bytes);
    let mut entries = Vec::new();

    for line in content.split('\n') {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match LogEntry::from_json_line(line) {
            Ok(entry) => entries.push(entry),
            Err(_) => report.lines_skipped += 1,
        }
    }

    if report.lines_skipped > 0 {
        tracing::debug!(
            path = %path.display(),
            skipped = report.lines_skipped,
            "skipped malformed log lines"
        );
    }

    (entries, report)
}

/// Read `files` in order, mapping each file's entries through `per_file`
///
/// Results come back in the same order as `files`. Large sets are read on the
/// rayon pool.
pub(crate) fn scan_files<T, F>(files: &[DayFile], per_file: F) -> (Vec<T>, ScanReport)
where
    T: Send,
    F: Fn(Vec<LogEntry>) -> T + Sync + Send,
{
    let read_one = |file: &DayFile| {
        let (entries, report) = read_day_file(&file.path);
        (per_file(entries), report)
    };

    let results: Vec<(T, ScanReport)> = if files.len() >= PARALLEL_SCAN_THRESHOLD {
        files.par_iter().map(read_one).collect()
    } else {
        files.iter().map(read_one).collect()
    };

    let mut total = ScanReport::default();
    let outputs = results
        .into_iter()
        .map(|(output, report)| {
            total.merge(report);
            output
        })
        .collect();

    (outputs, total)
}
