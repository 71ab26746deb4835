//! Spreadsheet input and output
//!
//! Accessioning batches arrive as CSV exports or Excel workbooks laid out
//! after the DASS template (see `columns`).

pub mod columns;
mod reader;
mod writer;

pub use reader::{Row, SheetFormat, Spreadsheet};
pub use writer::write_table;
