//! Fake client and sheet fixtures shared by tests

use async_trait::async_trait;
use serde_json::json;

use crate::accession::{AccessionClient, AccessionFailure, AccessionOutcome, AccessionRow, SheetAction};
use crate::api::ApiError;
use crate::sheet::columns::{INPUT_HEADERS, cols};

/// Records every call and fails on chosen object ids
#[derive(Debug, Default)]
pub struct RecordingClient {
    pub calls: Vec<usize>,
    pub fail_on_object: Vec<String>,
    /// Object ids whose object is saved but whose events fail
    pub fail_events_on: Vec<String>,
    next_id: usize,
}

impl RecordingClient {
    pub fn failing_on(object_id: &str) -> Self {
        Self {
            fail_on_object: vec![object_id.to_string()],
            ..Default::default()
        }
    }

    pub fn failing_events_on(object_id: &str) -> Self {
        Self {
            fail_events_on: vec![object_id.to_string()],
            ..Default::default()
        }
    }
}

#[async_trait]
impl AccessionClient for RecordingClient {
    async fn accession(
        &mut self,
        action: SheetAction,
        row: &AccessionRow,
    ) -> Result<AccessionOutcome, AccessionFailure> {
        self.calls.push(row.index);
        if self.fail_on_object.contains(&row.parent.archival_object_id) {
            return Err(ApiError::from_response(
                "/repositories/2/archival_objects",
                400,
                r#"{"error":"Invalid extent"}"#,
            )
            .into());
        }

        self.next_id += 1;
        let uri = match action {
            SheetAction::Create => format!("/repositories/2/archival_objects/{}", 1000 + self.next_id),
            SheetAction::Update => format!("/repositories/2/archival_objects/{}", row.parent.archival_object_id),
        };
        let event_uris = row
            .events
            .iter()
            .map(|e| (e.slot, format!("/repositories/2/events/{}{}", self.next_id, e.slot)))
            .collect();
        let outcome = AccessionOutcome {
            uri: uri.clone(),
            event_uris,
            record: json!({ "uri": uri, "component_id": row.component_id }),
            previous: (action == SheetAction::Update).then(|| json!({ "component_id": "old" })),
        };
        if self.fail_events_on.contains(&row.parent.archival_object_id) {
            return Err(AccessionFailure {
                error: ApiError::from_response("/repositories/2/events", 500, r#"{"error":"boom"}"#),
                partial: Some(AccessionOutcome {
                    event_uris: Vec::new(),
                    ..outcome
                }),
            });
        }
        Ok(outcome)
    }
}

/// CSV line for the template, with the given parent record id
pub fn csv_row(object_id: &str) -> String {
    let mut cells = vec![String::new(); INPUT_HEADERS.len()];
    cells[cols::REPOSITORY_NAME] = "mssa".to_string();
    cells[cols::PARENT_RECORD] = if object_id.is_empty() {
        String::new()
    } else {
        format!("https://aspace.example.edu/repositories/2/resources/77#tree::archival_object_{}", object_id)
    };
    cells[cols::TITLE] = format!("Disk {}", object_id);
    cells[cols::COMPONENT_ID] = format!("dass-{}", object_id);
    cells[10] = "ingestion".to_string();
    cells[11] = "pass".to_string();
    cells[12] = "2024-05-01".to_string();
    cells.join(",")
}

/// Full CSV body: two header rows followed by one row per object id
pub fn csv_sheet(object_ids: &[&str]) -> String {
    let mut lines = vec![INPUT_HEADERS.join(","), "instructions".to_string()];
    lines.extend(object_ids.iter().map(|id| csv_row(id)));
    lines.join("\n") + "\n"
}
