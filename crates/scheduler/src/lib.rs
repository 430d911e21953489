//! Daily notification sweep scheduling.
//!
//! Each sweep runs at a fixed local wall-clock time in the configured
//! timezone. The scheduler is started explicitly from `main`; services never
//! start it themselves, so tests call the sweeps directly.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use devtodo_common::{AppError, AppResult, SchedulerConfig};

/// Executes the daily sweeps. Implemented by the server over the
/// notification service.
#[async_trait::async_trait]
pub trait SweepExecutor: Send + Sync {
    /// Notify todos due tomorrow. Returns the number of notifications created.
    async fn run_due_soon_sweep(&self) -> Result<u64, Box<dyn std::error::Error + Send + Sync>>;

    /// Notify overdue todos. Returns the number of notifications created.
    async fn run_overdue_sweep(&self) -> Result<u64, Box<dyn std::error::Error + Send + Sync>>;
}

/// When the sweeps fire.
#[derive(Debug, Clone, Copy)]
pub struct SweepSchedule {
    /// Timezone the wall-clock times are interpreted in.
    pub timezone: Tz,
    /// Local time of the due-soon sweep.
    pub due_soon_at: NaiveTime,
    /// Local time of the overdue sweep.
    pub overdue_at: NaiveTime,
}

impl SweepSchedule {
    /// Parse the schedule out of the scheduler configuration section.
    pub fn from_config(config: &SchedulerConfig) -> AppResult<Self> {
        let timezone: Tz = config
            .timezone
            .parse()
            .map_err(|_| AppError::Config(format!("Unknown timezone: {}", config.timezone)))?;

        Ok(Self {
            timezone,
            due_soon_at: parse_time(&config.due_soon_at)?,
            overdue_at: parse_time(&config.overdue_at)?,
        })
    }
}

fn parse_time(value: &str) -> AppResult<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| AppError::Config(format!("Invalid sweep time (expected HH:MM): {value}")))
}

/// Time remaining until the next occurrence of `at` local time in `tz`.
///
/// Recomputed before every sleep, so DST transitions shift the next run
/// rather than accumulating drift. A time skipped by a DST jump resolves to
/// the following hour.
fn duration_until(now: DateTime<Utc>, tz: Tz, at: NaiveTime) -> std::time::Duration {
    let local_now = now.with_timezone(&tz);
    let mut date = local_now.date_naive();

    if local_now.time() >= at {
        date = date.succ_opt().unwrap_or(date);
    }

    let target = match tz.from_local_datetime(&date.and_time(at)) {
        chrono::LocalResult::Single(dt) | chrono::LocalResult::Ambiguous(dt, _) => dt,
        chrono::LocalResult::None => tz
            .from_local_datetime(&(date.and_time(at) + Duration::hours(1)))
            .earliest()
            .unwrap_or_else(|| tz.from_utc_datetime(&date.and_time(at))),
    };

    (target.with_timezone(&Utc) - now)
        .to_std()
        .unwrap_or(std::time::Duration::ZERO)
}

/// Spawn one background task per sweep.
pub fn run_scheduler<E: SweepExecutor + 'static>(schedule: SweepSchedule, executor: Arc<E>) {
    let due_soon_executor = executor.clone();
    let overdue_executor = executor;

    tokio::spawn(async move {
        loop {
            let wait = duration_until(Utc::now(), schedule.timezone, schedule.due_soon_at);
            tracing::info!(wait_secs = wait.as_secs(), "Next due-soon sweep scheduled");
            tokio::time::sleep(wait).await;

            match due_soon_executor.run_due_soon_sweep().await {
                Ok(count) => tracing::info!(count, "Due-soon sweep completed"),
                Err(e) => tracing::error!(error = %e, "Due-soon sweep failed"),
            }
        }
    });

    tokio::spawn(async move {
        loop {
            let wait = duration_until(Utc::now(), schedule.timezone, schedule.overdue_at);
            tracing::info!(wait_secs = wait.as_secs(), "Next overdue sweep scheduled");
            tokio::time::sleep(wait).await;

            match overdue_executor.run_overdue_sweep().await {
                Ok(count) => tracing::info!(count, "Overdue sweep completed"),
                Err(e) => tracing::error!(error = %e, "Overdue sweep failed"),
            }
        }
    });

    tracing::info!(
        timezone = %schedule.timezone,
        due_soon_at = %schedule.due_soon_at,
        overdue_at = %schedule.overdue_at,
        "Notification sweep scheduler started"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_duration_until_later_today() {
        let now = Utc.with_ymd_and_hms(2026, 6, 9, 8, 0, 0).unwrap();
        let wait = duration_until(now, chrono_tz::UTC, at(9, 0));

        assert_eq!(wait, std::time::Duration::from_secs(3600));
    }

    #[test]
    fn test_duration_until_wraps_to_tomorrow() {
        let now = Utc.with_ymd_and_hms(2026, 6, 9, 10, 0, 0).unwrap();
        let wait = duration_until(now, chrono_tz::UTC, at(9, 0));

        assert_eq!(wait, std::time::Duration::from_secs(23 * 3600));
    }

    #[test]
    fn test_duration_until_exact_time_schedules_next_day() {
        let now = Utc.with_ymd_and_hms(2026, 6, 9, 9, 0, 0).unwrap();
        let wait = duration_until(now, chrono_tz::UTC, at(9, 0));

        assert_eq!(wait, std::time::Duration::from_secs(24 * 3600));
    }

    #[test]
    fn test_duration_until_respects_timezone() {
        // 08:00 UTC is 05:00 in Sao Paulo (UTC-3): 09:00 local is 4h away.
        let now = Utc.with_ymd_and_hms(2026, 6, 9, 8, 0, 0).unwrap();
        let wait = duration_until(now, chrono_tz::America::Sao_Paulo, at(9, 0));

        assert_eq!(wait, std::time::Duration::from_secs(4 * 3600));
    }

    #[test]
    fn test_schedule_from_config() {
        let config = SchedulerConfig::default();
        let schedule = SweepSchedule::from_config(&config).unwrap();

        assert_eq!(schedule.timezone, chrono_tz::UTC);
        assert_eq!(schedule.due_soon_at, at(9, 0));
        assert_eq!(schedule.overdue_at, at(10, 0));
    }

    #[test]
    fn test_schedule_rejects_bad_time() {
        let config = SchedulerConfig {
            due_soon_at: "9am".to_string(),
            ..SchedulerConfig::default()
        };

        assert!(SweepSchedule::from_config(&config).is_err());
    }

    #[test]
    fn test_schedule_rejects_unknown_timezone() {
        let config = SchedulerConfig {
            timezone: "Mars/Olympus_Mons".to_string(),
            ..SchedulerConfig::default()
        };

        assert!(SweepSchedule::from_config(&config).is_err());
    }
}
