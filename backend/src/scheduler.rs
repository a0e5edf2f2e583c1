//! Daily job generating yesterday's test results

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Utc};
use tokio::task::JoinHandle;

use crate::config::SchedulerConfig;
use crate::error::AppError;
use crate::services::MedicalTestService;

const ACTOR: &str = "scheduler";

/// Counts of one run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub generated: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// First `hour:minute` at `offset` strictly after `now`
pub fn next_run(now: DateTime<Utc>, time: NaiveTime, offset: FixedOffset) -> DateTime<Utc> {
    let local_now = now.with_timezone(&offset).naive_local();
    let mut target = local_now.date().and_time(time);
    if target <= local_now {
        target += Duration::days(1);
    }
    (target - Duration::seconds(i64::from(offset.local_minus_utc()))).and_utc()
}

/// The calendar day before `now` at `offset`
pub fn yesterday(now: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    let today = now.with_timezone(&offset).date_naive();
    today.pred_opt().unwrap_or(today)
}

fn schedule(config: &SchedulerConfig) -> Option<(NaiveTime, FixedOffset)> {
    let time = NaiveTime::from_hms_opt(config.hour, config.minute, 0)?;
    let offset = FixedOffset::east_opt(config.utc_offset_hours * 3600)?;
    Some((time, offset))
}

/// Generate results for every test taken on `date`
pub async fn generate_results(service: &MedicalTestService, date: NaiveDate) -> RunSummary {
    let mut summary = RunSummary::default();

    let ids = match service.find_ids_by_date(date).await {
        Ok(ids) => ids,
        Err(e) => {
            tracing::error!(%date, error = %e, "Failed to load test appointments");
            summary.failed += 1;
            return summary;
        }
    };

    for id in ids {
        match service.generate_result_for(id, ACTOR).await {
            Ok(()) => summary.generated += 1,
            Err(AppError::InvalidMedicalTestData(reason)) => {
                tracing::debug!(test_id = id, %reason, "Skipping test result");
                summary.skipped += 1;
            }
            Err(e) => {
                tracing::error!(test_id = id, error = %e, "Failed to generate test result");
                summary.failed += 1;
            }
        }
    }

    summary
}

/// Start the daily loop; `None` when the configured time is unusable
pub fn spawn(service: MedicalTestService, config: &SchedulerConfig) -> Option<JoinHandle<()>> {
    let Some((time, offset)) = schedule(config) else {
        tracing::error!(?config, "Invalid scheduler time, daily test results disabled");
        return None;
    };

    Some(tokio::spawn(async move {
        loop {
            let now = Utc::now();
            let at = next_run(now, time, offset);
            tracing::info!(next_run = %at, "Test result job scheduled");

            let wait = (at - now).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;

            let date = yesterday(Utc::now(), offset);
            let summary = generate_results(&service, date).await;
            tracing::info!(
                %date,
                generated = summary.generated,
                skipped = summary.skipped,
                failed = summary.failed,
                "Test result job finished"
            );
        }
    }))
}
