//! `schedule`: fire the pipeline once a day

use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;

use super::resolve_credentials;
use crate::cli::ScheduleArgs;
use crate::config::Config;
use crate::pipeline::run_once;
use crate::scheduler::{DailySchedule, Scheduler, SystemClock};

pub async fn handle_schedule_command(args: ScheduleArgs, config: &Config) -> Result<()> {
    let schedule = match &args.at {
        Some(at) => DailySchedule::parse(at).with_context(|| format!("Invalid time of day: {}", at))?,
        None => config.schedule()?,
    };
    // Unattended: fail now rather than at the first fire
    let credentials = resolve_credentials(config, false)?;
    config.layout()?;

    info!(
        "Scheduling daily runs at {} for {}",
        schedule.time().format("%H:%M"),
        config.folders.network.as_deref().map(|p| p.display().to_string()).unwrap_or_default()
    );

    let clock = SystemClock;
    let scheduler = Scheduler::new(schedule, Arc::new(clock));
    let credentials = &credentials;
    let clock = &clock;

    scheduler
        .run(
            move |_| async move { run_once(config, credentials, clock).await.map(|_| ()) },
            args.runs,
        )
        .await;
    Ok(())
}
