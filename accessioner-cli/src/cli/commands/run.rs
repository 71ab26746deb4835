//! `run`: one pass over the network folder

use anyhow::Result;

use super::resolve_credentials;
use crate::cli::RunArgs;
use crate::config::Config;
use crate::pipeline::run_once;
use crate::scheduler::SystemClock;

pub async fn handle_run_command(args: RunArgs, config: &Config) -> Result<()> {
    let credentials = resolve_credentials(config, !args.no_prompt)?;
    let summary = run_once(config, &credentials, &SystemClock).await?;
    summary.print();
    Ok(())
}
