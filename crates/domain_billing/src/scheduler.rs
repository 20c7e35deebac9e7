//! Background scheduler
//!
//! Fires the bill generator at local midnight on the 1st of each month and
//! the overdue sweep at every local midnight. The task polls the injected
//! [`Clock`] on a fixed interval, so a manual clock can drive it in tests.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use core_kernel::{Clock, Timezone};

use crate::generator::BillGenerator;
use crate::overdue::OverdueSweeper;

/// Default interval between clock checks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Next local midnight on the 1st of a month, strictly after `now`
pub fn next_monthly_run(tz: Timezone, now: DateTime<Utc>) -> DateTime<Utc> {
    let today = tz.local_date(now);
    let this_month = first_of_month(today.year(), today.month());
    let candidate = tz.start_of_day(this_month);
    if candidate > now {
        return candidate;
    }
    let (year, month) = if today.month() == 12 {
        (today.year() + 1, 1)
    } else {
        (today.year(), today.month() + 1)
    };
    tz.start_of_day(first_of_month(year, month))
}

/// Next local midnight strictly after `now`
pub fn next_daily_run(tz: Timezone, now: DateTime<Utc>) -> DateTime<Utc> {
    let today = tz.local_date(now);
    let start = tz.start_of_day(today);
    if start > now {
        return start;
    }
    let tomorrow = today.checked_add_days(Days::new(1)).unwrap_or(NaiveDate::MAX);
    tz.start_of_day(tomorrow)
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

/// Runs generation and the overdue sweep on their schedules
pub struct BillingScheduler {
    generator: BillGenerator,
    sweeper: OverdueSweeper,
    timezone: Timezone,
    poll_interval: Duration,
}

impl BillingScheduler {
    pub fn new(generator: BillGenerator, sweeper: OverdueSweeper) -> Self {
        let timezone = generator.policy().timezone;
        Self {
            generator,
            sweeper,
            timezone,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Spawns the scheduler task
    pub fn start(self, clock: Arc<dyn Clock>) -> SchedulerHandle {
        let shutdown = Arc::new(Notify::new());
        let signal = shutdown.clone();

        let task = tokio::spawn(async move {
            let tz = self.timezone;
            let started = clock.now();
            let mut next_monthly = next_monthly_run(tz, started);
            let mut next_daily = next_daily_run(tz, started);
            info!(%tz, %next_monthly, %next_daily, "Billing scheduler started");

            let mut ticker = tokio::time::interval(self.poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = signal.notified() => {
                        info!("Billing scheduler received shutdown signal");
                        break;
                    }
                    _ = ticker.tick() => {
                        let now = clock.now();

                        if now >= next_monthly {
                            let report = self.generator.run().await;
                            info!(
                                period = %report.period,
                                created = report.created.len(),
                                "Scheduled bill generation ran"
                            );
                            next_monthly = next_monthly_run(tz, now);
                        }

                        if now >= next_daily {
                            let today = tz.local_date(now);
                            let report = self.sweeper.sweep(today).await;
                            info!(
                                %today,
                                marked_overdue = report.marked_overdue.len(),
                                "Scheduled overdue sweep ran"
                            );
                            next_daily = next_daily_run(tz, now);
                        }
                    }
                }
            }

            info!("Billing scheduler stopped");
        });

        SchedulerHandle { shutdown, task }
    }
}

/// Handle to a running scheduler
pub struct SchedulerHandle {
    shutdown: Arc<Notify>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signals the scheduler and waits for the task to finish
    pub async fn shutdown(self) {
        self.shutdown.notify_one();
        if let Err(e) = self.task.await {
            warn!(error = %e, "Billing scheduler task ended abnormally");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Asia::Kolkata;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_monthly_run_is_first_of_next_month() {
        let tz = Timezone::default();
        assert_eq!(next_monthly_run(tz, utc(2025, 9, 15, 10, 0)), utc(2025, 10, 1, 0, 0));
        assert_eq!(next_monthly_run(tz, utc(2025, 12, 31, 23, 59)), utc(2026, 1, 1, 0, 0));
    }

    #[test]
    fn test_monthly_run_at_boundary_moves_forward() {
        let tz = Timezone::default();
        assert_eq!(next_monthly_run(tz, utc(2025, 10, 1, 0, 0)), utc(2025, 11, 1, 0, 0));
    }

    #[test]
    fn test_monthly_run_respects_timezone() {
        let tz = Timezone::new(Kolkata);
        // 2025-09-30 18:30 UTC is 2025-10-01 00:00 IST
        assert_eq!(next_monthly_run(tz, utc(2025, 9, 30, 12, 0)), utc(2025, 9, 30, 18, 30));
        assert_eq!(next_monthly_run(tz, utc(2025, 9, 30, 18, 30)), utc(2025, 10, 31, 18, 30));
    }

    #[test]
    fn test_daily_run() {
        let tz = Timezone::default();
        assert_eq!(next_daily_run(tz, utc(2025, 10, 11, 8, 0)), utc(2025, 10, 12, 0, 0));
        assert_eq!(next_daily_run(tz, utc(2025, 10, 12, 0, 0)), utc(2025, 10, 13, 0, 0));

        let ist = Timezone::new(Kolkata);
        assert_eq!(next_daily_run(ist, utc(2025, 10, 11, 20, 0)), utc(2025, 10, 12, 18, 30));
    }
}
