//! `check`: validate a spreadsheet without touching ArchivesSpace
//!
//! Unlike a real run this keeps going after the first bad row, so every
//! problem in the sheet is reported at once.

use anyhow::{Context, Result};
use colored::*;

use crate::accession::{SheetAction, validate_row};
use crate::cli::CheckArgs;
use crate::config::Config;
use crate::sheet::Spreadsheet;

/// Per-row verdicts: (row index, line, problem)
pub fn check_sheet(sheet: &Spreadsheet, action: SheetAction) -> Vec<(usize, usize, Option<String>)> {
    sheet
        .rows()
        .map(|row| {
            let problem = validate_row(&row, action).err().map(|e| e.to_string());
            (row.index, row.line, problem)
        })
        .collect()
}

pub fn handle_check_command(args: CheckArgs, config: &Config) -> Result<()> {
    if !args.file.exists() {
        anyhow::bail!("File does not exist: {}", args.file.display());
    }

    let action = match args.action {
        Some(action) => SheetAction::from(action),
        None => SheetAction::from_path(&args.file).with_context(|| {
            format!(
                "{} does not contain 'create' or 'update'; pass --action",
                args.file.display()
            )
        })?,
    };

    let sheet = Spreadsheet::open(&args.file, config.sheets.header_rows)
        .with_context(|| format!("Failed to open {}", args.file.display()))?;

    println!(
        "Checking {} as {}",
        args.file.display().to_string().cyan(),
        action.to_string().bold()
    );

    let verdicts = check_sheet(&sheet, action);
    let mut invalid = 0;
    for (index, line, problem) in &verdicts {
        match problem {
            None => println!("  {} row {} (line {})", "✓".green(), index, line),
            Some(reason) => {
                invalid += 1;
                println!("  {} row {} (line {}): {}", "✗".red(), index, line, reason);
            }
        }
    }

    println!();
    if invalid > 0 {
        anyhow::bail!("{} of {} row(s) are invalid", invalid, verdicts.len());
    }
    println!("{}", format!("All {} row(s) are valid", verdicts.len()).green());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::csv_sheet;

    #[test]
    fn test_check_reports_every_bad_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mssa_update.csv");
        std::fs::write(&path, csv_sheet(&["11", "", "13", ""])).unwrap();
        let sheet = Spreadsheet::open(&path, 2).unwrap();

        let verdicts = check_sheet(&sheet, SheetAction::Update);

        let bad: Vec<usize> = verdicts
            .iter()
            .filter(|(_, _, problem)| problem.is_some())
            .map(|(index, _, _)| *index)
            .collect();
        assert_eq!(verdicts.len(), 4);
        assert_eq!(bad, vec![2, 4]);
    }

    #[test]
    fn test_check_command_fails_on_invalid_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.csv");
        std::fs::write(&path, csv_sheet(&["11", ""])).unwrap();

        let args = CheckArgs {
            file: path,
            action: Some(crate::cli::ActionArg::Create),
        };
        let err = handle_check_command(args, &Config::default()).unwrap_err();
        assert!(err.to_string().contains("1 of 2"));
    }

    #[test]
    fn test_check_command_needs_an_action() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.csv");
        std::fs::write(&path, csv_sheet(&["11"])).unwrap();

        let args = CheckArgs { file: path, action: None };
        let err = handle_check_command(args, &Config::default()).unwrap_err();
        assert!(err.to_string().contains("--action"));
    }
}
