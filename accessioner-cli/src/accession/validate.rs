//! Row validation
//!
//! `validate_row` is pure: it inspects a spreadsheet row and either produces a
//! typed `AccessionRow` or a human-readable reason the row cannot be applied.

use once_cell::sync::Lazy;
use regex::Regex;

use super::dates::normalize_date;
use super::{AccessionRow, EventEntry, SheetAction};
use crate::sheet::Row;
use crate::sheet::columns::{EVENT_SLOTS, INPUT_HEADERS, cols};

/// Trailing archival object id, e.g. "...#tree::archival_object_1234" or "1234"
static OBJECT_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:^|_)(\d+)$").unwrap());

/// Resource id in a staff interface URL, e.g. ".../resources/567#tree::..."
static RESOURCE_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"/resources/(\d+)/?(?:#|$)").unwrap());

/// Identifiers extracted from the Parent Record column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentRecord {
    /// Archival object the row updates (or creates a child under)
    pub archival_object_id: String,
    /// Resource (collection) the object belongs to
    pub resource_id: Option<String>,
}

/// Why a row cannot be applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Header of the offending column
    pub column: &'static str,
    pub reason: String,
}

impl ValidationError {
    fn new(col: usize, reason: impl Into<String>) -> Self {
        Self {
            column: INPUT_HEADERS[col],
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (column '{}')", self.reason, self.column)
    }
}

impl std::error::Error for ValidationError {}

/// Extract archival object and resource ids from a Parent Record value
pub fn parse_parent_record(value: &str) -> Option<ParentRecord> {
    let value = value.trim();
    let archival_object_id = OBJECT_ID.captures(value)?.get(1)?.as_str().to_string();
    let resource_id = RESOURCE_ID
        .captures(value)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string());

    Some(ParentRecord {
        archival_object_id,
        resource_id,
    })
}

/// Validate a row for the given sheet action
pub fn validate_row(row: &Row, action: SheetAction) -> Result<AccessionRow, ValidationError> {
    let repository_code = required(row, cols::REPOSITORY_NAME, "missing repository")?;

    let parent_value = row.cell(cols::PARENT_RECORD);
    if parent_value.is_empty() {
        return Err(ValidationError::new(cols::PARENT_RECORD, "missing identifier"));
    }
    let parent = parse_parent_record(parent_value).ok_or_else(|| {
        ValidationError::new(
            cols::PARENT_RECORD,
            format!("missing identifier in '{}'", parent_value),
        )
    })?;

    if action == SheetAction::Create && parent.resource_id.is_none() {
        return Err(ValidationError::new(
            cols::PARENT_RECORD,
            format!("no resource id in '{}'", parent_value),
        ));
    }

    let bytes = match optional(row, cols::NUMBER_OF_BYTES) {
        Some(raw) => {
            let digits = raw.replace(',', "");
            if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
                return Err(ValidationError::new(
                    cols::NUMBER_OF_BYTES,
                    format!("'{}' is not a whole number of bytes", raw),
                ));
            }
            Some(digits)
        }
        None => None,
    };

    let mut events = Vec::new();
    for slot in EVENT_SLOTS {
        let Some(event_type) = optional(row, slot.event_type) else {
            continue;
        };
        let outcome = required(row, slot.outcome, "missing event outcome")?;
        let begin_raw = required(row, slot.begin, "missing event date")?;
        let begin =
            normalize_date(&begin_raw).map_err(|reason| ValidationError::new(slot.begin, reason))?;

        events.push(EventEntry {
            slot: slot.slot,
            event_type: event_type.to_lowercase(),
            outcome: outcome.to_lowercase(),
            begin,
            outcome_note: row.cell(slot.outcome_note).to_string(),
        });
    }

    Ok(AccessionRow {
        index: row.index,
        line: row.line,
        repository_code,
        parent,
        title: row.cell(cols::TITLE).to_string(),
        component_id: row.cell(cols::COMPONENT_ID).to_string(),
        extent_type: optional(row, cols::EXTENT_TYPE),
        bytes,
        container_summary: optional(row, cols::CONTAINER_SUMMARY),
        top_container: optional(row, cols::TOP_CONTAINER),
        events,
    })
}

fn required(row: &Row, col: usize, reason: &str) -> Result<String, ValidationError> {
    optional(row, col).ok_or_else(|| ValidationError::new(col, reason))
}

fn optional(row: &Row, col: usize) -> Option<String> {
    let value = row.cell(col).trim();
    (!value.is_empty()).then(|| value.to_string())
}
