//! Day-rotating append writer
//!
//! Holds the handle of the day file currently being appended. The caller
//! (`AuditLog`) wraps it in a single mutex, so the rotation check and the
//! append happen as one step for every record.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use super::day_file::day_file_name;
use super::error::{AuditError, AuditResult};
use crate::types::{LogEntry, LogLevel};

/// The day file currently open for appending
#[derive(Debug)]
struct OpenDayFile {
    date: NaiveDate,
    path: PathBuf,
    file: File,
}

/// Append-only writer that switches files when the date changes
#[derive(Debug, Default)]
pub(crate) struct DayWriter {
    current: Option<OpenDayFile>,
}

impl DayWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Date of the currently open file, if any
    #[cfg(test)]
    pub(crate) fn current_date(&self) -> Option<NaiveDate> {
        self.current.as_ref().map(|f| f.date)
    }

    /// Append one entry to the day file of its timestamp, rotating if needed
    pub(crate) fn write(&mut self, log_dir: &Path, entry: &LogEntry) -> AuditResult<()> {
        let date = entry.timestamp.date_naive();
        let mut line = entry.to_json_line()?;
        line.push('\n');

        let open = self.ensure_open(log_dir, date)?;
        open.file
            .write_all(line.as_bytes())
            .map_err(|source| AuditError::Write {
                path: open.path.clone(),
                source,
            })?;

        mirror(entry);

        Ok(())
    }

    /// Make sure the file for `date` is the open one
    ///
    /// A cached handle whose file was deleted underneath it (by a retention
    /// sweep) is dropped and the file recreated.
    fn ensure_open(&mut self, log_dir: &Path, date: NaiveDate) -> AuditResult<&mut OpenDayFile> {
        let open = match self.current.take() {
            Some(open) if open.date == date && open.path.exists() => open,
            old => {
                if let Some(old) = old {
                    tracing::debug!(path = %old.path.display(), "closing audit day file");
                }
                open_day_file(log_dir, date)?
            }
        };

        Ok(self.current.insert(open))
    }
}

fn open_day_file(log_dir: &Path, date: NaiveDate) -> AuditResult<OpenDayFile> {
    fs::create_dir_all(log_dir).map_err(|source| AuditError::CreateDir {
        path: log_dir.to_path_buf(),
        source,
    })?;

    let path = log_dir.join(day_file_name(date));
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|source| AuditError::OpenFile {
            path: path.clone(),
            source,
        })?;

    tracing::debug!(path = %path.display(), "opened audit day file");

    Ok(OpenDayFile { date, path, file })
}

/// Echo a written entry to the operator console
fn mirror(entry: &LogEntry) {
    let time = entry.timestamp.format("%Y-%m-%d %H:%M:%S");
    let kind = entry.log_type.as_str();

    match entry.level {
        LogLevel::Debug => {
            tracing::debug!(target: "audit", %time, kind, ip = %entry.ip, "{}", entry.action)
        }
        LogLevel::Info => {
            tracing::info!(target: "audit", %time, kind, ip = %entry.ip, "{}", entry.action)
        }
        LogLevel::Warn => {
            tracing::warn!(target: "audit", %time, kind, ip = %entry.ip, "{}", entry.action)
        }
        LogLevel::Error | LogLevel::Fatal => {
            tracing::error!(
                target: "audit",
                %time,
                level = entry.level.as_str(),
                kind,
                ip = %entry.ip,
                "{}",
                entry.action
            )
        }
    }
}
