use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use labsched_core::config::SchedulerConfig;
use labsched_core::SchedulerResult;
use labsched_domain::entities::Schedule;
use labsched_domain::repositories::JobRepository;

use crate::backoff::effective_period_minutes;

/// Decides which schedules may attempt job creation this cycle.
pub struct ScheduleFilter {
    job_repo: Arc<dyn JobRepository>,
    config: SchedulerConfig,
}

impl ScheduleFilter {
    pub fn new(job_repo: Arc<dyn JobRepository>, config: SchedulerConfig) -> Self {
        Self { job_repo, config }
    }

    pub async fn filter(
        &self,
        schedules: Vec<Schedule>,
        now: DateTime<Utc>,
    ) -> SchedulerResult<Vec<Schedule>> {
        let mut eligible = Vec::with_capacity(schedules.len());
        for schedule in schedules {
            if self.is_eligible(&schedule, now).await? {
                eligible.push(schedule);
            }
        }
        Ok(eligible)
    }

    pub async fn is_eligible(
        &self,
        schedule: &Schedule,
        now: DateTime<Utc>,
    ) -> SchedulerResult<bool> {
        // Schedules nobody has touched in a long time are dropped for the
        // cycle rather than kept limping along against stale intent.
        let stale_after = Duration::hours(self.config.schedule_stale_hours);
        if now - schedule.updated_at > stale_after {
            debug!(
                schedule = schedule.id,
                updated_at = %schedule.updated_at,
                "skipping stale schedule"
            );
            return Ok(false);
        }

        let Some(latest_job_id) = schedule.latest_child_job() else {
            return Ok(true);
        };
        let latest_job = self.job_repo.get(latest_job_id).await?;
        if latest_job.is_none() {
            warn!(
                schedule = schedule.id,
                job = latest_job_id,
                "latest child job missing from store; treating schedule as due"
            );
            return Ok(true);
        }

        let period = effective_period_minutes(
            schedule,
            latest_job.as_ref(),
            self.config.boot_retry_minutes,
        );
        let elapsed = now - latest_job.as_ref().map(|j| j.timestamp).unwrap_or(now);
        Ok(elapsed > Duration::minutes(period))
    }
}
