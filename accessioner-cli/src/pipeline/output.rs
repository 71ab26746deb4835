//! Output spreadsheets annotated with new identifiers

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use log::{info, warn};

use super::processor::{ProcessedRow, ProcessingResult};
use crate::config::OutputConflict;
use crate::error::HousekeepingError;
use crate::sheet::columns::{EVENT_SLOTS, INPUT_HEADERS, output_headers};
use crate::sheet::{SheetFormat, write_table};

pub struct OutputWriter {
    dir: PathBuf,
    policy: OutputConflict,
}

impl OutputWriter {
    pub fn new(dir: &Path, policy: OutputConflict) -> Self {
        Self {
            dir: dir.to_path_buf(),
            policy,
        }
    }

    /// Write the output for a processed sheet
    ///
    /// Returns `Ok(None)` when no object was saved, since there is nothing to record.
    pub fn write(&self, result: &ProcessingResult, now: NaiveDateTime) -> Result<Option<PathBuf>, HousekeepingError> {
        if result.recorded().next().is_none() {
            return Ok(None);
        }
        let Some(format) = result.format else {
            return Ok(None);
        };

        let target = self.target_path(&result.sheet, format, now)?;
        let rows: Vec<Vec<String>> = result.recorded().map(output_row).collect();

        write_table(&target, format, &output_headers(), &rows)
            .map_err(|e| HousekeepingError::io(&target, "write output", format!("{:#}", e)))?;
        info!("Wrote {} ({} row(s))", target.display(), rows.len());
        Ok(Some(target))
    }

    fn target_path(&self, sheet: &Path, format: SheetFormat, now: NaiveDateTime) -> Result<PathBuf, HousekeepingError> {
        let stem = sheet
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "sheet".to_string());
        let ext = format.output_extension();
        let plain = self.dir.join(format!("{}_out.{}", stem, ext));

        if !plain.exists() {
            return Ok(plain);
        }

        match self.policy {
            OutputConflict::Overwrite => {
                warn!("Overwriting existing output {}", plain.display());
                Ok(plain)
            }
            OutputConflict::Fail => Err(HousekeepingError::io(
                &plain,
                "write output",
                "file already exists",
            )),
            OutputConflict::Suffix => {
                let stamp = now.format("%Y%m%d-%H%M%S");
                let mut candidate = self.dir.join(format!("{}_out-{}.{}", stem, stamp, ext));
                let mut n = 1;
                while candidate.exists() {
                    n += 1;
                    candidate = self.dir.join(format!("{}_out-{}-{}.{}", stem, stamp, n, ext));
                }
                Ok(candidate)
            }
        }
    }
}

/// Original cells padded to the template width, then the new identifiers
fn output_row(processed: &ProcessedRow) -> Vec<String> {
    let mut cells: Vec<String> = processed.row.cells().iter().take(INPUT_HEADERS.len()).cloned().collect();
    cells.resize(INPUT_HEADERS.len(), String::new());

    cells.push(processed.outcome.uri.clone());
    for slot in EVENT_SLOTS.iter() {
        cells.push(processed.outcome.event_uri(slot.slot).unwrap_or_default().to_string());
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accession::{AccessionOutcome, SheetAction};
    use crate::api::ApiError;
    use crate::error::SheetError;
    use crate::pipeline::processor::{RowFailure, SheetState};
    use crate::sheet::Row;
    use chrono::NaiveDate;
    use serde_json::Value;
    use std::fs;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap().and_hms_opt(9, 0, 5).unwrap()
    }

    fn processed(index: usize, uri: &str, events: Vec<(usize, &str)>) -> ProcessedRow {
        ProcessedRow {
            row: Row::new(index, index + 2, vec!["mssa".to_string(), String::new(), "parent".to_string()]),
            outcome: AccessionOutcome {
                uri: uri.to_string(),
                event_uris: events.into_iter().map(|(s, u)| (s, u.to_string())).collect(),
                record: Value::Null,
                previous: None,
            },
        }
    }

    fn result(sheet: &Path, succeeded: Vec<ProcessedRow>) -> ProcessingResult {
        ProcessingResult {
            sheet: sheet.to_path_buf(),
            format: SheetFormat::from_path(sheet),
            action: Some(SheetAction::Create),
            state: SheetState::Succeeded,
            succeeded,
            failure: None,
        }
    }

    fn read_csv(path: &Path) -> Vec<Vec<String>> {
        let mut reader = csv::ReaderBuilder::new().has_headers(false).from_path(path).unwrap();
        reader
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn test_output_row_layout() {
        let row = output_row(&processed(1, "/repositories/2/archival_objects/9", vec![(2, "/repositories/2/events/4")]));
        assert_eq!(row.len(), INPUT_HEADERS.len() + 4);
        assert_eq!(row[0], "mssa");
        assert_eq!(row[INPUT_HEADERS.len()], "/repositories/2/archival_objects/9");
        assert_eq!(row[INPUT_HEADERS.len() + 1], "");
        assert_eq!(row[INPUT_HEADERS.len() + 2], "/repositories/2/events/4");
    }

    #[test]
    fn test_writes_csv_with_identifiers() {
        let dir = tempfile::tempdir().unwrap();
        let writer = OutputWriter::new(dir.path(), OutputConflict::Suffix);
        let sheet = Path::new("/mnt/dass/mssa_create.csv");
        let rows = vec![
            processed(1, "/repositories/2/archival_objects/1", vec![]),
            processed(2, "/repositories/2/archival_objects/2", vec![]),
            processed(3, "/repositories/2/archival_objects/3", vec![]),
        ];

        let path = writer.write(&result(sheet, rows), now()).unwrap().unwrap();

        assert_eq!(path, dir.path().join("mssa_create_out.csv"));
        let table = read_csv(&path);
        assert_eq!(table.len(), 4);
        assert_eq!(table[0][INPUT_HEADERS.len()], "New_Component_URI");
        let ids: Vec<&str> = table[1..].iter().map(|r| r[INPUT_HEADERS.len()].as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "/repositories/2/archival_objects/1",
                "/repositories/2/archival_objects/2",
                "/repositories/2/archival_objects/3"
            ]
        );
    }

    #[test]
    fn test_saved_row_of_failed_sheet_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let writer = OutputWriter::new(dir.path(), OutputConflict::Suffix);
        let sheet = Path::new("/mnt/dass/mssa_create.csv");
        let mut failed = result(sheet, vec![processed(1, "/repositories/2/archival_objects/1", vec![])]);
        failed.state = SheetState::Failed;
        failed.failure = Some(RowFailure {
            index: Some(2),
            line: Some(4),
            error: SheetError::Incomplete {
                uri: "/repositories/2/archival_objects/2".to_string(),
                error: ApiError::from_response("/repositories/2/events", 500, "{}"),
            },
            partial: Some(processed(2, "/repositories/2/archival_objects/2", vec![])),
        });

        let path = writer.write(&failed, now()).unwrap().unwrap();

        let table = read_csv(&path);
        assert_eq!(table.len(), 3);
        assert_eq!(table[2][INPUT_HEADERS.len()], "/repositories/2/archival_objects/2");
    }

    #[test]
    fn test_nothing_written_without_successes() {
        let dir = tempfile::tempdir().unwrap();
        let writer = OutputWriter::new(dir.path(), OutputConflict::Suffix);
        let out = writer.write(&result(Path::new("update.csv"), vec![]), now()).unwrap();
        assert!(out.is_none());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_conflict_suffix_keeps_existing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("update_out.csv"), "old").unwrap();
        let writer = OutputWriter::new(dir.path(), OutputConflict::Suffix);

        let rows = vec![processed(1, "/repositories/2/archival_objects/1", vec![])];
        let path = writer.write(&result(Path::new("update.csv"), rows), now()).unwrap().unwrap();

        assert_eq!(path, dir.path().join("update_out-20261019-090005.csv"));
        assert_eq!(fs::read_to_string(dir.path().join("update_out.csv")).unwrap(), "old");
    }

    #[test]
    fn test_conflict_overwrite_replaces() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("update_out.csv"), "old").unwrap();
        let writer = OutputWriter::new(dir.path(), OutputConflict::Overwrite);

        let rows = vec![processed(1, "/repositories/2/archival_objects/1", vec![])];
        let path = writer.write(&result(Path::new("update.csv"), rows), now()).unwrap().unwrap();

        assert_eq!(path, dir.path().join("update_out.csv"));
        assert_ne!(fs::read_to_string(&path).unwrap(), "old");
    }

    #[test]
    fn test_conflict_fail_refuses() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("update_out.csv"), "old").unwrap();
        let writer = OutputWriter::new(dir.path(), OutputConflict::Fail);

        let rows = vec![processed(1, "/repositories/2/archival_objects/1", vec![])];
        let err = writer.write(&result(Path::new("update.csv"), rows), now()).unwrap_err();

        assert!(matches!(err, HousekeepingError::Io { .. }));
        assert_eq!(fs::read_to_string(dir.path().join("update_out.csv")).unwrap(), "old");
    }
}
