//! Fixed column layout of the accessioning template
//!
//! Columns are addressed by position. The header text in the sheet itself is
//! informational only and is never used for lookups.

/// Column indices (must match `INPUT_HEADERS`)
pub mod cols {
    pub const REPOSITORY_NAME: usize = 0;
    pub const PARENT_RECORD: usize = 2;
    pub const TITLE: usize = 3;
    pub const COMPONENT_ID: usize = 4;
    pub const EXTENT_TYPE: usize = 5;
    pub const NUMBER_OF_BYTES: usize = 6;
    pub const CONTAINER_SUMMARY: usize = 7;
    pub const TOP_CONTAINER: usize = 8;
}

/// Header names of the input template, in column order
pub const INPUT_HEADERS: [&str; 23] = [
    "Repository Name",
    "Security Tag",
    "Parent Record",
    "Title",
    "Component Unique ID",
    "Type_1",
    "Number_of_bytes",
    "Container_Summary",
    "Top Container",
    "Collection Name",
    "Event_Type_1",
    "Outcome_1",
    "Begin_1",
    "Outcome_Note_1",
    "Event_Type_2",
    "Outcome_2",
    "Begin_2",
    "Outcome_Note_2",
    "Event_Type_3",
    "Outcome_3",
    "Begin_3",
    "Outcome_Note_3",
    "This field will not be ingested into ArchivesSpace, this information is only shared with the Digital Accessioning Service",
];

/// Columns appended to output spreadsheets
pub const OUTPUT_EXTRA_HEADERS: [&str; 4] =
    ["New_Component_URI", "Event_URI_1", "Event_URI_2", "Event_URI_3"];

/// Column positions of one event slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventColumns {
    /// 1-based slot number, as used in the header names
    pub slot: usize,
    pub event_type: usize,
    pub outcome: usize,
    pub begin: usize,
    pub outcome_note: usize,
}

/// The three event slots of a row
pub const EVENT_SLOTS: [EventColumns; 3] = [
    EventColumns { slot: 1, event_type: 10, outcome: 11, begin: 12, outcome_note: 13 },
    EventColumns { slot: 2, event_type: 14, outcome: 15, begin: 16, outcome_note: 17 },
    EventColumns { slot: 3, event_type: 18, outcome: 19, begin: 20, outcome_note: 21 },
];

/// Full header row of an output spreadsheet
pub fn output_headers() -> Vec<&'static str> {
    INPUT_HEADERS
        .iter()
        .chain(OUTPUT_EXTRA_HEADERS.iter())
        .copied()
        .collect()
}
