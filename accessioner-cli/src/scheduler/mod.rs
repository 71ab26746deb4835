//! Daily trigger with an injectable clock
//!
//! `DailySchedule` is a pure fire-time calculation. `Scheduler` sleeps on a
//! `Clock` until each fire time and runs the job to completion before it
//! computes the next one, so runs never overlap inside one process.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Local, NaiveDateTime, NaiveTime};
use log::{error, info, warn};

/// Source of local wall-clock time
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    /// Return once `deadline` has been reached
    async fn sleep_until(&self, deadline: NaiveDateTime);
}

/// The machine's local clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    async fn sleep_until(&self, deadline: NaiveDateTime) {
        // Re-check after waking: local time can jump (DST, NTP)
        loop {
            let remaining = deadline - self.now();
            match remaining.to_std() {
                Ok(d) if !d.is_zero() => tokio::time::sleep(d).await,
                _ => return,
            }
        }
    }
}

/// Fires once a day at a fixed local time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    at: NaiveTime,
}

impl DailySchedule {
    pub fn new(at: NaiveTime) -> Self {
        Self { at }
    }

    /// Parse an `HH:MM` time of day
    pub fn parse(value: &str) -> Result<Self, chrono::ParseError> {
        NaiveTime::parse_from_str(value.trim(), "%H:%M").map(Self::new)
    }

    pub fn time(&self) -> NaiveTime {
        self.at
    }

    /// First fire time strictly after `now`
    pub fn next_fire_after(&self, now: NaiveDateTime) -> NaiveDateTime {
        let today = now.date().and_time(self.at);
        if today > now {
            today
        } else {
            today + ChronoDuration::days(1)
        }
    }

    /// Fire times strictly between `fired` and `finished`
    pub fn missed_between(&self, fired: NaiveDateTime, finished: NaiveDateTime) -> usize {
        let mut missed = 0;
        let mut next = self.next_fire_after(fired);
        while next < finished {
            missed += 1;
            next = self.next_fire_after(next);
        }
        missed
    }
}

/// Runs a job at every fire time of a `DailySchedule`
pub struct Scheduler {
    schedule: DailySchedule,
    clock: Arc<dyn Clock>,
}

impl Scheduler {
    pub fn new(schedule: DailySchedule, clock: Arc<dyn Clock>) -> Self {
        Self { schedule, clock }
    }

    /// Fire the job on schedule, `max_fires` times or forever
    ///
    /// Job failures are logged and the schedule continues. Fire times that
    /// pass while a run is still going are skipped.
    pub async fn run<F, Fut>(&self, mut job: F, max_fires: Option<usize>) -> usize
    where
        F: FnMut(NaiveDateTime) -> Fut,
        Fut: Future<Output = anyhow::Result<()>>,
    {
        let mut fired = 0;
        loop {
            if max_fires.is_some_and(|max| fired >= max) {
                return fired;
            }

            let next = self.schedule.next_fire_after(self.clock.now());
            info!("Next run scheduled for {}", next.format("%Y-%m-%d %H:%M"));
            self.clock.sleep_until(next).await;

            fired += 1;
            info!("Scheduled run starting ({})", next.format("%Y-%m-%d %H:%M"));
            if let Err(e) = job(next).await {
                error!("Scheduled run failed: {:#}", e);
            }

            let missed = self.schedule.missed_between(next, self.clock.now());
            if missed > 0 {
                warn!(
                    "Run that started {} overran {} scheduled time(s); they were skipped",
                    next.format("%Y-%m-%d %H:%M"),
                    missed
                );
            }
        }
    }
}
