//! Write tables of string cells as CSV or XLSX

use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::Workbook;

use super::reader::SheetFormat;

/// Write a header row followed by data rows in the given format
pub fn write_table(
    path: &Path,
    format: SheetFormat,
    headers: &[&str],
    rows: &[Vec<String>],
) -> Result<()> {
    match format {
        SheetFormat::Csv => write_csv(path, headers, rows),
        SheetFormat::Workbook => write_xlsx(path, headers, rows),
    }
}

fn write_csv(path: &Path, headers: &[&str], rows: &[Vec<String>]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;

    wtr.write_record(headers)
        .context("Failed to write CSV header")?;

    for row in rows {
        wtr.write_record(row)
            .with_context(|| format!("Failed to write row to {}", path.display()))?;
    }

    wtr.flush().context("Failed to flush CSV writer")?;
    Ok(())
}

fn write_xlsx(path: &Path, headers: &[&str], rows: &[Vec<String>]) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (col, name) in headers.iter().enumerate() {
        worksheet.write_string(0, col as u16, *name)?;
    }

    for (row_idx, row) in rows.iter().enumerate() {
        let excel_row = (row_idx + 1) as u32;
        for (col, value) in row.iter().enumerate() {
            if !value.is_empty() {
                worksheet.write_string(excel_row, col as u16, value)?;
            }
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("Failed to save Excel file: {}", path.display()))?;

    Ok(())
}
