//! Command-line interface

pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::accession::SheetAction;

#[derive(Parser, Debug)]
#[command(
    name = "accessioner",
    version,
    about = "Apply born-digital accessioning spreadsheets to ArchivesSpace"
)]
pub struct Cli {
    /// Path to the config file (defaults to ACCESSIONER_CONFIG, then the user config dir)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process every spreadsheet in the network folder now
    Run(RunArgs),
    /// Stay running and process the network folder once a day
    Schedule(ScheduleArgs),
    /// Validate a spreadsheet offline, without calling ArchivesSpace
    Check(CheckArgs),
    /// Print the resolved folder layout
    Paths,
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Never prompt for missing credentials
    #[arg(long)]
    pub no_prompt: bool,
}

#[derive(Parser, Debug)]
pub struct ScheduleArgs {
    /// Override the configured time of day (HH:MM)
    #[arg(long, value_name = "HH:MM")]
    pub at: Option<String>,

    /// Stop after this many scheduled runs
    #[arg(long, value_name = "N")]
    pub runs: Option<usize>,
}

#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Spreadsheet to validate (.csv or .xlsx)
    pub file: PathBuf,

    /// Validate as this action instead of reading it from the file name
    #[arg(long, value_enum)]
    pub action: Option<ActionArg>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionArg {
    Create,
    Update,
}

impl From<ActionArg> for SheetAction {
    fn from(arg: ActionArg) -> Self {
        match arg {
            ActionArg::Create => SheetAction::Create,
            ActionArg::Update => SheetAction::Update,
        }
    }
}
