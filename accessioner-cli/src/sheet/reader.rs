//! Read accessioning spreadsheets (CSV or Excel workbooks)
//!
//! Files are parsed once on open. `Spreadsheet::rows` builds `Row` values on
//! demand and can be called again to restart from the first data row.

use std::path::Path;

use calamine::{Data, DataType, Reader, open_workbook_auto};

use crate::error::SheetError;

/// Physical format of a spreadsheet file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Csv,
    Workbook,
}

impl SheetFormat {
    /// Detect the format from the file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "csv" => Some(SheetFormat::Csv),
            "xlsx" | "xlsm" | "xls" | "ods" => Some(SheetFormat::Workbook),
            _ => None,
        }
    }

    /// Extension used for output files of this format
    pub fn output_extension(&self) -> &'static str {
        match self {
            SheetFormat::Csv => "csv",
            SheetFormat::Workbook => "xlsx",
        }
    }
}

/// One data row of a spreadsheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// 1-based position among data rows (header and blank rows excluded)
    pub index: usize,
    /// 1-based line in the file
    pub line: usize,
    cells: Vec<String>,
}

impl Row {
    pub fn new(index: usize, line: usize, cells: Vec<String>) -> Self {
        Self { index, line, cells }
    }

    /// Trimmed cell value, empty when the column is absent
    pub fn cell(&self, col: usize) -> &str {
        self.cells.get(col).map(|s| s.as_str()).unwrap_or("")
    }

    pub fn cells(&self) -> &[String] {
        &self.cells
    }
}

/// An opened spreadsheet
#[derive(Debug, Clone)]
pub struct Spreadsheet {
    format: SheetFormat,
    header_rows: usize,
    raw: Vec<Vec<String>>,
}

impl Spreadsheet {
    /// Open and parse a spreadsheet, skipping `header_rows` leading rows
    pub fn open(path: &Path, header_rows: usize) -> Result<Self, SheetError> {
        let format = SheetFormat::from_path(path).ok_or_else(|| {
            SheetError::malformed(path, "unsupported file extension")
        })?;

        let raw = match format {
            SheetFormat::Csv => read_csv(path)?,
            SheetFormat::Workbook => read_workbook(path)?,
        };

        log::debug!(
            "Opened {} ({} raw rows, {} header rows)",
            path.display(),
            raw.len(),
            header_rows
        );

        Ok(Self {
            format,
            header_rows,
            raw,
        })
    }

    pub fn format(&self) -> SheetFormat {
        self.format
    }

    /// Data rows in file order. Blank rows are skipped and not counted.
    pub fn rows(&self) -> impl Iterator<Item = Row> + '_ {
        self.raw
            .iter()
            .enumerate()
            .skip(self.header_rows)
            .filter(|(_, cells)| cells.iter().any(|c| !c.is_empty()))
            .enumerate()
            .map(|(i, (line_idx, cells))| Row::new(i + 1, line_idx + 1, cells.clone()))
    }
}

fn read_csv(path: &Path) -> Result<Vec<Vec<String>>, SheetError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| SheetError::malformed(path, e.to_string()))?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| SheetError::malformed(path, e.to_string()))?;
        rows.push(record.iter().map(|c| c.trim().to_string()).collect());
    }
    Ok(rows)
}

fn read_workbook(path: &Path) -> Result<Vec<Vec<String>>, SheetError> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| SheetError::malformed(path, e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| SheetError::malformed(path, "workbook has no sheets"))?
        .map_err(|e| SheetError::malformed(path, e.to_string()))?;

    // Ranges start at the first used cell; pad so line numbers stay true
    let leading = range.start().map(|(row, _)| row as usize).unwrap_or(0);
    let leading_cols = range.start().map(|(_, col)| col as usize).unwrap_or(0);

    let mut rows: Vec<Vec<String>> = vec![Vec::new(); leading];
    for row in range.rows() {
        let mut cells = vec![String::new(); leading_cols];
        cells.extend(row.iter().map(cell_to_string));
        rows.push(cells);
    }
    Ok(rows)
}

/// Convert an Excel cell to the string form a CSV export would carry
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(_) | Data::DateTimeIso(_) => cell
            .as_date()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| cell.to_string()),
        Data::DurationIso(s) => s.clone(),
    }
}
