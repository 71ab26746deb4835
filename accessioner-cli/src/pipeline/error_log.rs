//! Daily error log on the network drive
//!
//! One file per day, `{YYYY-MM-DD}.log`, one tab-separated line per entry.
//! Entries are only ever appended.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::HousekeepingError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: NaiveDateTime,
    pub sheet: String,
    /// Data row index of the failure, if it happened on a row
    pub row: Option<usize>,
    pub message: String,
}

impl LogEntry {
    pub fn new(timestamp: NaiveDateTime, sheet: impl Into<String>, row: Option<usize>, message: impl Into<String>) -> Self {
        Self {
            timestamp,
            sheet: sheet.into(),
            row,
            message: message.into(),
        }
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let row = self.row.map(|r| r.to_string()).unwrap_or_else(|| "-".to_string());
        write!(
            f,
            "{}\t{}\t{}\t{}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            single_line(&self.sheet),
            row,
            single_line(&self.message)
        )
    }
}

fn single_line(value: &str) -> String {
    value
        .chars()
        .map(|c| if matches!(c, '\t' | '\n' | '\r') { ' ' } else { c })
        .collect()
}

pub struct ErrorLog {
    dir: PathBuf,
}

impl ErrorLog {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!("{}.log", date.format("%Y-%m-%d")))
    }

    /// Append an entry to the log file of the entry's day
    pub fn append(&self, entry: &LogEntry) -> Result<(), HousekeepingError> {
        let path = self.path_for(entry.timestamp.date());
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| HousekeepingError::io(&path, "open log", e))?;
        writeln!(file, "{}", entry).map_err(|e| HousekeepingError::io(&path, "append to log", e))
    }
}
