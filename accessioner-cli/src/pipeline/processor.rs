//! Drive one spreadsheet through validation and accessioning
//!
//! Per sheet: `Start -> Running -> {Succeeded, Failed}`. The first invalid
//! row or failed API call moves the sheet to `Failed`; later rows are never
//! validated, sent, or logged.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::accession::{AccessionClient, AccessionOutcome, SheetAction, validate_row};
use crate::error::SheetError;
use crate::sheet::{Row, SheetFormat, Spreadsheet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetState {
    Start,
    Running,
    Succeeded,
    Failed,
}

impl std::fmt::Display for SheetState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SheetState::Start => write!(f, "start"),
            SheetState::Running => write!(f, "running"),
            SheetState::Succeeded => write!(f, "succeeded"),
            SheetState::Failed => write!(f, "failed"),
        }
    }
}

/// A row that was applied successfully
#[derive(Debug, Clone)]
pub struct ProcessedRow {
    pub row: Row,
    pub outcome: AccessionOutcome,
}

/// The first failure in a sheet
#[derive(Debug)]
pub struct RowFailure {
    /// 1-based data row index, `None` when the sheet failed before any row
    pub index: Option<usize>,
    /// 1-based line in the file
    pub line: Option<usize>,
    pub error: SheetError,
    /// The failing row, when its object was saved before a later call failed
    pub partial: Option<ProcessedRow>,
}

/// Outcome of processing one spreadsheet
#[derive(Debug)]
pub struct ProcessingResult {
    pub sheet: PathBuf,
    pub format: Option<SheetFormat>,
    pub action: Option<SheetAction>,
    pub state: SheetState,
    pub succeeded: Vec<ProcessedRow>,
    pub failure: Option<RowFailure>,
}

impl ProcessingResult {
    pub fn is_success(&self) -> bool {
        self.state == SheetState::Succeeded
    }

    /// Data row index of the first failure
    pub fn failed_at(&self) -> Option<usize> {
        self.failure.as_ref().and_then(|f| f.index)
    }

    /// Rows whose object exists in ArchivesSpace: every succeeded row, plus
    /// the failing row if its object was saved before the failure
    pub fn recorded(&self) -> impl Iterator<Item = &ProcessedRow> {
        self.succeeded
            .iter()
            .chain(self.failure.iter().filter_map(|f| f.partial.as_ref()))
    }

    /// URIs of objects created or updated, in row order
    pub fn identifiers(&self) -> Vec<&str> {
        self.recorded().map(|p| p.outcome.uri.as_str()).collect()
    }

    pub fn sheet_name(&self) -> String {
        self.sheet
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.sheet.display().to_string())
    }
}

/// Processes spreadsheets one at a time against an `AccessionClient`
pub struct SheetProcessor<'a, C: AccessionClient + ?Sized> {
    client: &'a mut C,
    header_rows: usize,
}

impl<'a, C: AccessionClient + ?Sized> SheetProcessor<'a, C> {
    pub fn new(client: &'a mut C, header_rows: usize) -> Self {
        Self {
            client,
            header_rows,
        }
    }

    /// Process a spreadsheet end to end. Never fails: errors end up in the result.
    pub async fn process(&mut self, path: &Path) -> ProcessingResult {
        let mut result = ProcessingResult {
            sheet: path.to_path_buf(),
            format: None,
            action: None,
            state: SheetState::Start,
            succeeded: Vec::new(),
            failure: None,
        };

        let Some(action) = SheetAction::from_path(path) else {
            let error = SheetError::UnknownAction {
                file_name: result.sheet_name(),
            };
            fail(&mut result, None, error, None);
            return result;
        };
        result.action = Some(action);

        let sheet = match Spreadsheet::open(path, self.header_rows) {
            Ok(sheet) => sheet,
            Err(error) => {
                fail(&mut result, None, error, None);
                return result;
            }
        };

        result.format = Some(sheet.format());
        transition(&mut result, SheetState::Running);

        for row in sheet.rows() {
            match self.apply_row(action, &row).await {
                Ok(outcome) => {
                    debug!("{} row {}: {}", result.sheet_name(), row.index, outcome.uri);
                    result.succeeded.push(ProcessedRow { row, outcome });
                }
                Err((error, partial)) => {
                    let partial = partial.map(|outcome| ProcessedRow {
                        row: row.clone(),
                        outcome,
                    });
                    fail(&mut result, Some(&row), error, partial);
                    return result;
                }
            }
        }

        transition(&mut result, SheetState::Succeeded);
        info!(
            "{}: {} row(s) accessioned",
            result.sheet_name(),
            result.succeeded.len()
        );
        result
    }

    /// Validate and send one row. On failure, also returns what was saved.
    async fn apply_row(
        &mut self,
        action: SheetAction,
        row: &Row,
    ) -> Result<AccessionOutcome, (SheetError, Option<AccessionOutcome>)> {
        let valid = validate_row(row, action).map_err(|e| (SheetError::from(e), None))?;
        self.client
            .accession(action, &valid)
            .await
            .map_err(|failure| match failure.partial {
                Some(outcome) => (
                    SheetError::Incomplete {
                        uri: outcome.uri.clone(),
                        error: failure.error,
                    },
                    Some(outcome),
                ),
                None => (SheetError::Api(failure.error), None),
            })
    }
}

fn transition(result: &mut ProcessingResult, next: SheetState) {
    debug!("{}: {} -> {}", result.sheet_name(), result.state, next);
    result.state = next;
}

fn fail(result: &mut ProcessingResult, row: Option<&Row>, error: SheetError, partial: Option<ProcessedRow>) {
    match row {
        Some(r) => warn!(
            "{}: row {} (line {}) failed with {} error, skipping the rest of the sheet: {}",
            result.sheet_name(),
            r.index,
            r.line,
            error.kind(),
            error
        ),
        None => warn!("{}: {} error: {}", result.sheet_name(), error.kind(), error),
    }
    transition(result, SheetState::Failed);
    result.failure = Some(RowFailure {
        index: row.map(|r| r.index),
        line: row.map(|r| r.line),
        error,
        partial,
    });
}
