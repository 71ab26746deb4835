//! Error taxonomy for sheet processing and post-run housekeeping

use std::path::{Path, PathBuf};

use crate::accession::ValidationError;
use crate::api::ApiError;

/// Errors that stop processing of a single spreadsheet
#[derive(Debug)]
pub enum SheetError {
    /// File could not be opened or parsed as a spreadsheet
    MalformedFile { path: PathBuf, reason: String },
    /// File name names neither a create nor an update batch
    UnknownAction { file_name: String },
    /// A row failed validation
    Validation(ValidationError),
    /// The archival-management API rejected a call or was unreachable
    Api(ApiError),
    /// The object at `uri` was saved, then a follow-up call failed
    Incomplete { uri: String, error: ApiError },
}

impl SheetError {
    pub fn malformed(path: &Path, reason: impl Into<String>) -> Self {
        SheetError::MalformedFile {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Short category name used in summaries
    pub fn kind(&self) -> &'static str {
        match self {
            SheetError::MalformedFile { .. } => "malformed file",
            SheetError::UnknownAction { .. } => "unknown action",
            SheetError::Validation(_) => "validation",
            SheetError::Api(_) | SheetError::Incomplete { .. } => "api",
        }
    }
}

impl std::fmt::Display for SheetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SheetError::MalformedFile { path, reason } => {
                write!(f, "cannot read spreadsheet {}: {}", path.display(), reason)
            }
            SheetError::UnknownAction { file_name } => write!(
                f,
                "{} -> filename does not contain 'create' or 'update'",
                file_name
            ),
            SheetError::Validation(e) => write!(f, "{}", e),
            SheetError::Api(e) => write!(f, "{}", e),
            SheetError::Incomplete { uri, error } => {
                write!(f, "{} was saved but a follow-up call failed: {}", uri, error)
            }
        }
    }
}

impl std::error::Error for SheetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SheetError::Validation(e) => Some(e),
            SheetError::Api(e) => Some(e),
            SheetError::Incomplete { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl From<ValidationError> for SheetError {
    fn from(e: ValidationError) -> Self {
        SheetError::Validation(e)
    }
}

impl From<ApiError> for SheetError {
    fn from(e: ApiError) -> Self {
        SheetError::Api(e)
    }
}

/// Failures after a sheet has been processed. These never undo accessioning.
#[derive(Debug)]
pub enum HousekeepingError {
    /// Spreadsheet could not be moved to its destination folder
    FileMove {
        from: PathBuf,
        to: PathBuf,
        reason: String,
    },
    /// Output, backup or log file could not be written
    Io {
        path: PathBuf,
        action: &'static str,
        reason: String,
    },
}

impl HousekeepingError {
    pub fn io(path: &Path, action: &'static str, reason: impl ToString) -> Self {
        HousekeepingError::Io {
            path: path.to_path_buf(),
            action,
            reason: reason.to_string(),
        }
    }
}

impl std::fmt::Display for HousekeepingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HousekeepingError::FileMove { from, to, reason } => write!(
                f,
                "failed to move {} to {}: {}",
                from.display(),
                to.display(),
                reason
            ),
            HousekeepingError::Io {
                path,
                action,
                reason,
            } => write!(f, "failed to {} {}: {}", action, path.display(), reason),
        }
    }
}

impl std::error::Error for HousekeepingError {}
