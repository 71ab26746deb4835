mod accession;
mod api;
mod cli;
mod config;
mod error;
mod pipeline;
mod scheduler;
mod sheet;

use anyhow::Result;
use clap::Parser;

use cli::commands::{check, paths, run, schedule};
use cli::{Cli, Commands};
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run(args) => run::handle_run_command(args, &config).await,
        Commands::Schedule(args) => schedule::handle_schedule_command(args, &config).await,
        Commands::Check(args) => check::handle_check_command(args, &config),
        Commands::Paths => paths::handle_paths_command(&config),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "warn,accessioner=debug" } else { "warn,accessioner=info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp_secs()
        .init();
}
