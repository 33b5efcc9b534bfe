use labsched_domain::entities::{Job, JobStatus, Schedule};

/// Effective minimum inter-job interval for this cycle, in minutes.
///
/// A schedule whose most recent job hit a boot-up error retries after the
/// short interval instead of waiting out its configured period. Schedules
/// whose period is already at or below the short interval keep it.
pub fn effective_period_minutes(
    schedule: &Schedule,
    latest_job: Option<&Job>,
    boot_retry_minutes: i64,
) -> i64 {
    if schedule.error_count == 0
        || !schedule.has_children()
        || schedule.period_minutes <= boot_retry_minutes
    {
        return schedule.period_minutes;
    }
    match latest_job {
        Some(job) if job.status == JobStatus::BootupErr => boot_retry_minutes,
        _ => schedule.period_minutes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use labsched_domain::entities::JobStatus;
    use labsched_testing_utils::{JobBuilder, ScheduleBuilder};

    #[test]
    fn test_boot_error_forces_short_retry() {
        let schedule = ScheduleBuilder::new(1)
            .with_period_minutes(5760)
            .with_children_jobs(&[7])
            .with_error_count(2)
            .build();
        let job = JobBuilder::new(7, 1).with_status(JobStatus::BootupErr).build();

        assert_eq!(effective_period_minutes(&schedule, Some(&job), 60), 60);
    }

    #[test]
    fn test_no_error_keeps_configured_period() {
        let schedule = ScheduleBuilder::new(1)
            .with_period_minutes(5760)
            .with_children_jobs(&[7])
            .build();
        let job = JobBuilder::new(7, 1).with_status(JobStatus::Complete).build();

        assert_eq!(effective_period_minutes(&schedule, Some(&job), 60), 5760);
    }

    #[test]
    fn test_recovered_job_reverts_to_period() {
        // error_count still nonzero but the latest job did not boot-error.
        let schedule = ScheduleBuilder::new(1)
            .with_period_minutes(5760)
            .with_children_jobs(&[8])
            .with_error_count(1)
            .build();
        let job = JobBuilder::new(8, 1).with_status(JobStatus::Complete).build();

        assert_eq!(effective_period_minutes(&schedule, Some(&job), 60), 5760);
    }

    #[test]
    fn test_short_period_unchanged_by_backoff() {
        let schedule = ScheduleBuilder::new(1)
            .with_period_minutes(30)
            .with_children_jobs(&[7])
            .with_error_count(3)
            .build();
        let job = JobBuilder::new(7, 1).with_status(JobStatus::BootupErr).build();

        assert_eq!(effective_period_minutes(&schedule, Some(&job), 60), 30);
    }

    #[test]
    fn test_no_children_keeps_period() {
        let schedule = ScheduleBuilder::new(1)
            .with_period_minutes(1440)
            .with_error_count(5)
            .build();
        assert_eq!(effective_period_minutes(&schedule, None, 60), 1440);
    }
}
