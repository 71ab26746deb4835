//! Accessioning rows and the client seam
//!
//! A spreadsheet row becomes an `AccessionRow` once it passes validation.
//! `AccessionClient` applies one such row to the archival-management system.

mod dates;
mod validate;

pub use validate::{ParentRecord, ValidationError, validate_row};

use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;

use crate::api::ApiError;

/// What a spreadsheet asks for, taken from its file name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetAction {
    /// Create new item-level archival objects under the parent record
    Create,
    /// Update the archival object named by the parent record
    Update,
}

impl SheetAction {
    /// Detect the action from a file name ("create" wins if both appear)
    pub fn from_file_name(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        if lower.contains("create") {
            Some(SheetAction::Create)
        } else if lower.contains("update") {
            Some(SheetAction::Update)
        } else {
            None
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        Self::from_file_name(path.file_name()?.to_str()?)
    }
}

impl std::fmt::Display for SheetAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SheetAction::Create => write!(f, "create"),
            SheetAction::Update => write!(f, "update"),
        }
    }
}

/// One accessioning event attached to a row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventEntry {
    /// 1-based event slot (1..=3)
    pub slot: usize,
    pub event_type: String,
    pub outcome: String,
    /// Normalized to YYYY-MM-DD
    pub begin: String,
    pub outcome_note: String,
}

/// A validated spreadsheet row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessionRow {
    pub index: usize,
    pub line: usize,
    pub repository_code: String,
    pub parent: ParentRecord,
    pub title: String,
    pub component_id: String,
    pub extent_type: Option<String>,
    /// Byte count with separators removed
    pub bytes: Option<String>,
    pub container_summary: Option<String>,
    /// Top container indicator as written in the sheet
    pub top_container: Option<String>,
    pub events: Vec<EventEntry>,
}

/// Result of applying one row
#[derive(Debug, Clone, PartialEq)]
pub struct AccessionOutcome {
    /// URI of the created or updated archival object
    pub uri: String,
    /// (slot, URI) of each event posted for the row
    pub event_uris: Vec<(usize, String)>,
    /// Object state as stored after the call
    pub record: Value,
    /// Object state before an update
    pub previous: Option<Value>,
}

impl AccessionOutcome {
    /// Event URI for a slot, if one was posted
    pub fn event_uri(&self, slot: usize) -> Option<&str> {
        self.event_uris
            .iter()
            .find(|(s, _)| *s == slot)
            .map(|(_, uri)| uri.as_str())
    }
}

/// A failed row, with whatever was already saved before the failing call
#[derive(Debug, Clone, PartialEq)]
pub struct AccessionFailure {
    pub error: ApiError,
    /// Set when the archival object was created or updated but a later call
    /// (an event) failed. The object exists and must still be recorded.
    pub partial: Option<AccessionOutcome>,
}

impl From<ApiError> for AccessionFailure {
    fn from(error: ApiError) -> Self {
        Self {
            error,
            partial: None,
        }
    }
}

/// Applies validated rows to the archival-management system
#[async_trait]
pub trait AccessionClient: Send {
    /// Record one row. Failures are terminal for the current sheet.
    async fn accession(
        &mut self,
        action: SheetAction,
        row: &AccessionRow,
    ) -> Result<AccessionOutcome, AccessionFailure>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_from_file_name() {
        assert_eq!(
            SheetAction::from_file_name("MSSA_Create_2024-05-01.csv"),
            Some(SheetAction::Create)
        );
        assert_eq!(
            SheetAction::from_file_name("beinecke_UPDATE.xlsx"),
            Some(SheetAction::Update)
        );
        assert_eq!(SheetAction::from_file_name("batch_12.csv"), None);
    }

    #[test]
    fn test_action_from_path_uses_file_name_only() {
        let path = Path::new("/mnt/update_share/batch.csv");
        assert_eq!(SheetAction::from_path(path), None);
        let path = Path::new("/mnt/share/create_batch.csv");
        assert_eq!(SheetAction::from_path(path), Some(SheetAction::Create));
    }

    #[test]
    fn test_event_uri_lookup() {
        let outcome = AccessionOutcome {
            uri: "/repositories/2/archival_objects/1".to_string(),
            event_uris: vec![(1, "/repositories/2/events/5".to_string()), (3, "/repositories/2/events/6".to_string())],
            record: Value::Null,
            previous: None,
        };
        assert_eq!(outcome.event_uri(1), Some("/repositories/2/events/5"));
        assert_eq!(outcome.event_uri(2), None);
        assert_eq!(outcome.event_uri(3), Some("/repositories/2/events/6"));
    }
}
