//! Day file naming and discovery
//!
//! Every audit day lives in `logs_<YYYYMMDD>.log`. The date in the name is the
//! only thing query, stats and retention trust to select files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use super::error::{AuditError, AuditResult};
use crate::utils::time::DAY_FILE_DATE_FORMAT;

const PREFIX: &str = "logs_";
const SUFFIX: &str = ".log";

/// A day file found in the log directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayFile {
    pub path: PathBuf,
    pub date: NaiveDate,
}

/// File name for the given day, e.g. `logs_20250110.log`
pub fn day_file_name(date: NaiveDate) -> String {
    format!("{}{}{}", PREFIX, date.format(DAY_FILE_DATE_FORMAT), SUFFIX)
}

/// Extract the date from a day file name; `None` for anything else
pub fn parse_day_file_name(name: &str) -> Option<NaiveDate> {
    let digits = name.strip_prefix(PREFIX)?.strip_suffix(SUFFIX)?;
    if digits.len() != 8 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(digits, DAY_FILE_DATE_FORMAT).ok()
}

/// List day files in `dir`, oldest first
///
/// A missing directory is an empty log, not an error.
pub fn list_day_files(dir: &Path) -> AuditResult<Vec<DayFile>> {
    let read_dir = match fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(AuditError::ReadDir {
                path: dir.to_path_buf(),
                source,
            })
        }
    };

    let mut files = Vec::new();

    for entry in read_dir {
        let entry = entry.map_err(|source| AuditError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;

        if entry.file_type().map(|t| t.is_dir()).unwrap_or(true) {
            continue;
        }

        let name = entry.file_name();
        if let Some(date) = name.to_str().and_then(parse_day_file_name) {
            files.push(DayFile {
                path: entry.path(),
                date,
            });
        }
    }

    files.sort_by_key(|f| f.date);

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_day_file_name() {
        assert_eq!(day_file_name(date(2025, 1, 5)), "logs_20250105.log");
    }

    #[test]
    fn test_parse_day_file_name() {
        assert_eq!(parse_day_file_name("logs_20250110.log"), Some(date(2025, 1, 10)));
        assert_eq!(parse_day_file_name("logs_20251340.log"), None);
        assert_eq!(parse_day_file_name("logs_2025011.log"), None);
        assert_eq!(parse_day_file_name("logs_20250110.log.bak"), None);
        assert_eq!(parse_day_file_name("events_20250110.log"), None);
        assert_eq!(parse_day_file_name("logs_+2025011.log"), None);
    }

    #[test]
    fn test_list_day_files() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();

        fs::write(dir.join("logs_20250110.log"), "").unwrap();
        fs::write(dir.join("logs_20250101.log"), "").unwrap();
        fs::write(dir.join("notes.txt"), "").unwrap();
        fs::create_dir(dir.join("logs_20250102.log")).unwrap();

        let files = list_day_files(dir).unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].date, date(2025, 1, 1));
        assert_eq!(files[1].date, date(2025, 1, 10));
    }

    #[test]
    fn test_list_missing_dir_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let files = list_day_files(&temp_dir.path().join("nope")).unwrap();
        assert!(files.is_empty());
    }
}
