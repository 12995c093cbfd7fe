//! Daily trigger: poll the wall clock and run the pipeline once per day
//! at the configured local time.

use std::time::Duration;

use chrono::{Local, NaiveDateTime, NaiveTime};

use crate::app::App;
use crate::error::Result;

pub const POLL_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy)]
pub struct DailySchedule {
    at: NaiveTime,
}

impl DailySchedule {
    pub fn new(at: NaiveTime) -> Self {
        Self { at }
    }

    /// The first scheduled time strictly after `now`.
    pub fn next_after(&self, now: NaiveDateTime) -> NaiveDateTime {
        let today = now.date().and_time(self.at);
        if today > now {
            today
        } else {
            today + chrono::Duration::days(1)
        }
    }
}

/// Run until Ctrl-C. A run in progress is not interrupted.
pub async fn run(app: &App, schedule: DailySchedule) -> Result<()> {
    let mut next = schedule.next_after(Local::now().naive_local());
    tracing::info!(next_run = %next, "scheduler started");

    let mut ticker = tokio::time::interval(POLL_INTERVAL);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if Local::now().naive_local() >= next {
                    if let Err(e) = app.run_daily().await {
                        tracing::error!(error = %e, "daily run failed");
                    }
                    next = schedule.next_after(Local::now().naive_local());
                    tracing::info!(next_run = %next, "next run scheduled");
                }
            }
            result = &mut shutdown => {
                result?;
                tracing::info!("scheduler stopped");
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(date: &str, time: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("{date} {time}"), "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn schedule() -> DailySchedule {
        DailySchedule::new(NaiveTime::from_hms_opt(8, 30, 0).unwrap())
    }

    #[test]
    fn before_the_time_runs_today() {
        assert_eq!(
            schedule().next_after(at("2024-01-01", "07:59:00")),
            at("2024-01-01", "08:30:00")
        );
    }

    #[test]
    fn at_or_after_the_time_runs_tomorrow() {
        assert_eq!(
            schedule().next_after(at("2024-01-01", "08:30:00")),
            at("2024-01-02", "08:30:00")
        );
        assert_eq!(
            schedule().next_after(at("2024-12-31", "23:00:00")).date(),
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
        );
    }
}
