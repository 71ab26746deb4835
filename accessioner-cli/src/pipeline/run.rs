//! One pass over the network folder
//!
//! Sheets are processed one after another. A sheet's output, backups, error
//! log entry and move all happen after its processing finishes. Housekeeping
//! failures are logged and never undo accessioning.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Duration as ChronoDuration, NaiveDateTime};
use colored::Colorize;
use log::{error, info, warn};

use super::backup::BackupWriter;
use super::error_log::{ErrorLog, LogEntry};
use super::lock::RunLock;
use super::mover::FileMover;
use super::output::OutputWriter;
use super::processor::{ProcessingResult, SheetProcessor, SheetState};
use crate::accession::{AccessionClient, SheetAction};
use crate::api::{ArchivesSpaceAccessioner, ArchivesSpaceClient};
use crate::config::{Config, Credentials, FolderLayout, OutputConflict};
use crate::error::HousekeepingError;
use crate::scheduler::Clock;

/// Everything a run needs from the configuration
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub layout: FolderLayout,
    pub header_rows: usize,
    pub extensions: Vec<String>,
    pub output_conflict: OutputConflict,
    pub allow_overlap: bool,
    pub stale_lock_after: ChronoDuration,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Result<Self> {
        let hours = config.policy.stale_lock_hours;
        let stale_lock_after = i64::try_from(hours)
            .ok()
            .and_then(ChronoDuration::try_hours)
            .with_context(|| format!("Invalid policy.stale_lock_hours: {} is out of range", hours))?;

        Ok(Self {
            layout: config.layout()?,
            header_rows: config.sheets.header_rows,
            extensions: config
                .sheets
                .extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
            output_conflict: config.policy.output_conflict,
            allow_overlap: config.policy.allow_overlap,
            stale_lock_after,
        })
    }
}

/// What happened to one sheet
#[derive(Debug, Clone)]
pub struct SheetReport {
    pub sheet: String,
    pub action: Option<SheetAction>,
    pub state: SheetState,
    pub succeeded: usize,
    pub identifiers: Vec<String>,
    pub failed_at: Option<usize>,
    pub error: Option<String>,
    pub output: Option<PathBuf>,
    pub backups: Vec<PathBuf>,
    pub moved_to: Option<PathBuf>,
    pub housekeeping: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started: NaiveDateTime,
    pub sheets: Vec<SheetReport>,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.sheets.iter().filter(|s| s.state == SheetState::Succeeded).count()
    }

    pub fn failed(&self) -> usize {
        self.sheets.len() - self.succeeded()
    }

    /// Print a per-sheet summary to stdout
    pub fn print(&self) {
        if self.sheets.is_empty() {
            println!("{}", "No spreadsheets to process".dimmed());
            return;
        }

        println!("Run started {}", self.started.format("%Y-%m-%d %H:%M:%S"));
        for report in &self.sheets {
            let state = match report.state {
                SheetState::Succeeded => "OK".green().bold(),
                _ => "FAILED".red().bold(),
            };
            let action = report.action.map(|a| a.to_string()).unwrap_or_else(|| "?".to_string());
            println!(
                "{} {} [{}] {} row(s) accessioned, {} backup(s)",
                state,
                report.sheet.bold(),
                action,
                report.succeeded,
                report.backups.len()
            );
            for uri in &report.identifiers {
                println!("    {}", uri.dimmed());
            }
            if let Some(err) = &report.error {
                match report.failed_at {
                    Some(row) => println!("    row {}: {}", row, err),
                    None => println!("    {}", err),
                }
            }
            if let Some(path) = &report.output {
                println!("    output: {}", path.display());
            }
            if let Some(path) = &report.moved_to {
                println!("    moved to: {}", path.display());
            }
            for problem in &report.housekeeping {
                println!("    {} {}", "warning:".yellow(), problem);
            }
        }
        println!(
            "\n{} succeeded, {} failed",
            self.succeeded().to_string().green(),
            self.failed().to_string().red()
        );
    }
}

/// Spreadsheets directly inside `folder`, sorted by name
///
/// Directories, hidden files and Office lock files (`~$...`) are skipped.
pub fn discover_sheets(folder: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(folder)
        .with_context(|| format!("Failed to list network folder {}", folder.display()))?;

    let mut sheets = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to list network folder {}", folder.display()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || name.starts_with("~$") {
            continue;
        }
        let matches = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .is_some_and(|e| extensions.iter().any(|x| *x == e));
        if matches {
            sheets.push(path);
        }
    }
    sheets.sort();
    Ok(sheets)
}

/// Process `sheets` in order and settle each one
pub async fn process_all<C>(
    settings: &PipelineSettings,
    sheets: &[PathBuf],
    client: &mut C,
    clock: &dyn Clock,
) -> RunSummary
where
    C: AccessionClient + ?Sized,
{
    let started = clock.now();
    let layout = &settings.layout;
    let log = ErrorLog::new(&layout.logs);
    let outputs = OutputWriter::new(&layout.outputs, settings.output_conflict);
    let backups = BackupWriter::new(&layout.backups, started);
    let mover = FileMover::new(&layout.complete, &layout.errors);

    let mut summary = RunSummary {
        started,
        sheets: Vec::new(),
    };

    for sheet in sheets {
        info!("Processing {}", sheet.display());
        let result = SheetProcessor::new(&mut *client, settings.header_rows)
            .process(sheet)
            .await;
        let mut report = report_for(&result);

        if let Some(message) = &report.error {
            append(&log, LogEntry::new(clock.now(), &report.sheet, report.failed_at, message.clone()));
        }

        let mut problems: Vec<HousekeepingError> = Vec::new();
        match outputs.write(&result, clock.now()) {
            Ok(path) => report.output = path,
            Err(e) => problems.push(e),
        }
        match backups.write_all(&result) {
            Ok(paths) => report.backups = paths,
            Err(e) => problems.push(e),
        }
        match mover.settle(sheet, result.is_success(), clock.now()) {
            Ok(path) => report.moved_to = Some(path),
            Err(e) => problems.push(e),
        }

        for problem in problems {
            error!("{}: {}", report.sheet, problem);
            append(&log, LogEntry::new(clock.now(), &report.sheet, None, problem.to_string()));
            report.housekeeping.push(problem.to_string());
        }

        summary.sheets.push(report);
    }

    info!(
        "Run finished: {} sheet(s) succeeded, {} failed",
        summary.succeeded(),
        summary.failed()
    );
    summary
}

fn report_for(result: &ProcessingResult) -> SheetReport {
    SheetReport {
        sheet: result.sheet_name(),
        action: result.action,
        state: result.state,
        succeeded: result.succeeded.len(),
        identifiers: result.identifiers().into_iter().map(str::to_string).collect(),
        failed_at: result.failed_at(),
        error: result.failure.as_ref().map(|f| match f.line {
            Some(line) => format!("line {}: {}", line, f.error),
            None => f.error.to_string(),
        }),
        output: None,
        backups: Vec::new(),
        moved_to: None,
        housekeeping: Vec::new(),
    }
}

fn append(log: &ErrorLog, entry: LogEntry) {
    if let Err(e) = log.append(&entry) {
        // Nothing else records it, so at least keep it on the console
        error!("{} (while logging: {})", e, entry);
    }
}

/// Run the whole pipeline once against ArchivesSpace
///
/// Fails only for environment problems: unreachable folder, a run already in
/// progress, or a failed login. Per-sheet failures are part of the summary.
pub async fn run_once(config: &Config, credentials: &Credentials, clock: &dyn Clock) -> Result<RunSummary> {
    let settings = PipelineSettings::from_config(config)?;
    let layout = &settings.layout;
    layout.ensure()?;

    let started = clock.now();
    let _lock = RunLock::acquire(
        &layout.lock_file(),
        settings.allow_overlap,
        settings.stale_lock_after,
        started,
    )?;

    let sheets = discover_sheets(&layout.network, &settings.extensions)?;
    if sheets.is_empty() {
        info!("No spreadsheets in {}", layout.network.display());
        return Ok(RunSummary {
            started,
            sheets: Vec::new(),
        });
    }
    info!("Found {} spreadsheet(s) in {}", sheets.len(), layout.network.display());

    let mut client = ArchivesSpaceClient::new(&credentials.url, config.api_timeout())?;
    if let Err(e) = client.login(&credentials.username, &credentials.password).await {
        let message = format!("login to {} failed: {}", client.base_url(), e);
        append(&ErrorLog::new(&layout.logs), LogEntry::new(clock.now(), "-", None, message.clone()));
        warn!("No spreadsheets were processed");
        anyhow::bail!(message);
    }

    let mut accessioner = ArchivesSpaceAccessioner::new(
        client,
        &credentials.username,
        config.api.event_authorizer.clone(),
    );
    Ok(process_all(&settings, &sheets, &mut accessioner, clock).await)
}
