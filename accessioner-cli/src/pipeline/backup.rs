//! Point-in-time JSON snapshots of every object touched in a run

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use log::debug;
use serde_json::json;

use super::processor::{ProcessedRow, ProcessingResult};
use crate::error::HousekeepingError;

pub struct BackupWriter {
    dir: PathBuf,
    taken_at: NaiveDateTime,
}

impl BackupWriter {
    pub fn new(dir: &Path, taken_at: NaiveDateTime) -> Self {
        Self {
            dir: dir.to_path_buf(),
            taken_at,
        }
    }

    /// Back up every saved row of a sheet, stopping at the first write error
    pub fn write_all(&self, result: &ProcessingResult) -> Result<Vec<PathBuf>, HousekeepingError> {
        let sheet = result.sheet_name();
        result
            .recorded()
            .map(|processed| self.write(&sheet, processed))
            .collect()
    }

    /// Write one backup; never replaces an existing file
    pub fn write(&self, sheet: &str, processed: &ProcessedRow) -> Result<PathBuf, HousekeepingError> {
        let outcome = &processed.outcome;
        let snapshot = json!({
            "uri": outcome.uri,
            "sheet": sheet,
            "row": processed.row.index,
            "taken_at": self.taken_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
            "record": outcome.record,
            "previous": outcome.previous,
        });
        let body = serde_json::to_vec_pretty(&snapshot)
            .map_err(|e| HousekeepingError::io(&self.dir, "serialize backup", e))?;

        let base = format!(
            "{}_{}",
            outcome.uri.trim_start_matches('/').replace('/', "_"),
            self.taken_at.format("%Y%m%d-%H%M%S")
        );
        let mut n = 1;
        loop {
            let name = if n == 1 {
                format!("{}.json", base)
            } else {
                format!("{}-{}.json", base, n)
            };
            let path = self.dir.join(name);

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(&body)
                        .map_err(|e| HousekeepingError::io(&path, "write backup", e))?;
                    debug!("Backed up {} to {}", outcome.uri, path.display());
                    return Ok(path);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => n += 1,
                Err(e) => return Err(HousekeepingError::io(&path, "create backup", e)),
            }
        }
    }
}
