use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use labsched_core::{SchedulerError, SchedulerResult};
use labsched_domain::entities::Schedule;
use labsched_domain::repositories::ScheduleRepository;
use labsched_domain::value_objects::DeviceTarget;

use crate::filter::ScheduleFilter;
use crate::orchestrator::{JobAttempt, JobCreator};

/// How a cycle was invoked. Manual runs target one schedule, bypass its
/// suspended flag and tag the created job as user-triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Automatic,
    Manual(i64),
}

/// Per-schedule result of one cycle, returned for operator-facing logging.
#[derive(Debug, Clone)]
pub struct ScheduleOutcome {
    pub schedule_id: i64,
    pub test_name: String,
    pub result: JobAttempt,
}

/// Cycle entry point: loads eligible schedules, attempts job creation in
/// priority order per product group, then applies priority aging.
///
/// Cycles must not overlap; the trigger is responsible for serializing
/// invocations. Within a cycle everything runs sequentially, so a device
/// reserved for an earlier schedule is already invisible to later ones.
pub struct ScheduleRunner {
    schedule_repo: Arc<dyn ScheduleRepository>,
    filter: ScheduleFilter,
    creator: JobCreator,
}

impl ScheduleRunner {
    pub fn new(
        schedule_repo: Arc<dyn ScheduleRepository>,
        filter: ScheduleFilter,
        creator: JobCreator,
    ) -> Self {
        Self {
            schedule_repo,
            filter,
            creator,
        }
    }

    pub async fn run_cycle(
        &self,
        trigger: Trigger,
        now: DateTime<Utc>,
    ) -> SchedulerResult<Vec<ScheduleOutcome>> {
        let manual = matches!(trigger, Trigger::Manual(_));
        let schedules = match trigger {
            Trigger::Automatic => self.schedule_repo.list_active().await?,
            Trigger::Manual(id) => {
                let schedule = self
                    .schedule_repo
                    .get(id)
                    .await?
                    .ok_or(SchedulerError::ScheduleNotFound { id })?;
                vec![schedule]
            }
        };

        let eligible = self.filter.filter(schedules, now).await?;
        debug!(count = eligible.len(), "schedules eligible this cycle");

        let mut groups: BTreeMap<String, Vec<Schedule>> = BTreeMap::new();
        for schedule in eligible {
            groups.entry(schedule.product_group()).or_default().push(schedule);
        }

        let mut outcomes = Vec::new();
        for (product, mut group) in groups {
            // Lower priority_value goes first; stable sort keeps store
            // order among equals.
            group.sort_by_key(|s| s.priority_value);

            // Phase 1: one attempt per schedule, outcomes recorded.
            let mut attempts: Vec<(Schedule, JobAttempt)> = Vec::with_capacity(group.len());
            for schedule in group {
                let result = self.creator.create_job(&schedule, manual, now).await?;
                attempts.push((schedule, result));
            }

            // Phase 2: every winner at lab L makes same-group schedules
            // that lost on device contention and also target L one step
            // more urgent. Build-starved schedules are left alone.
            let winner_labs: Vec<String> = attempts
                .iter()
                .filter_map(|(_, result)| match result {
                    JobAttempt::Created { lab, .. } => Some(lab.clone()),
                    _ => None,
                })
                .collect();
            self.age_losers(&mut attempts, &winner_labs, &product).await?;

            for (schedule, result) in attempts {
                match &result {
                    JobAttempt::Created { job_id, lab } => info!(
                        schedule = schedule.id,
                        test = schedule.test_name.as_str(),
                        job = job_id,
                        lab = lab.as_str(),
                        "cycle outcome: job created"
                    ),
                    JobAttempt::NoDevice => info!(
                        schedule = schedule.id,
                        test = schedule.test_name.as_str(),
                        "cycle outcome: no device available"
                    ),
                    JobAttempt::NoBuild => info!(
                        schedule = schedule.id,
                        test = schedule.test_name.as_str(),
                        "cycle outcome: no build available"
                    ),
                }
                outcomes.push(ScheduleOutcome {
                    schedule_id: schedule.id,
                    test_name: schedule.test_name.clone(),
                    result,
                });
            }
        }

        Ok(outcomes)
    }

    async fn age_losers(
        &self,
        attempts: &mut [(Schedule, JobAttempt)],
        winner_labs: &[String],
        product: &str,
    ) -> SchedulerResult<()> {
        if winner_labs.is_empty() {
            return Ok(());
        }

        for (schedule, result) in attempts.iter_mut() {
            if *result != JobAttempt::NoDevice {
                continue;
            }
            let target_labs: BTreeSet<String> = schedule
                .device_targets
                .iter()
                .filter_map(|t| DeviceTarget::parse(t))
                .map(|t| t.lab)
                .collect();

            let before = schedule.priority_value;
            for lab in winner_labs {
                if schedule.priority_value == 0 {
                    break;
                }
                if target_labs.contains(lab) {
                    schedule.priority_value -= 1;
                }
            }
            if schedule.priority_value != before {
                debug!(
                    schedule = schedule.id,
                    product,
                    from = before,
                    to = schedule.priority_value,
                    "aged schedule priority after device contention loss"
                );
                self.schedule_repo.update(schedule).await?;
            }
        }
        Ok(())
    }
}
