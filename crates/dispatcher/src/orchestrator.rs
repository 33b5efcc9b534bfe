use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use labsched_core::SchedulerResult;
use labsched_domain::entities::{Job, JobStatus, Schedule};
use labsched_domain::repositories::{DeviceRepository, JobRepository, ScheduleRepository};
use labsched_domain::value_objects::{branch_version, test_type, DeviceTarget};

use crate::builds::BuildResolver;
use crate::matcher::DeviceMatcher;

/// Outcome of one job-creation attempt. `NoDevice` and `NoBuild` are
/// ordinary results fed back into priority aging, never errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobAttempt {
    Created { job_id: i64, lab: String },
    NoDevice,
    NoBuild,
}

/// Ties together device matching, build resolution and the transactional
/// reservation step; creates at most one job per call.
pub struct JobCreator {
    device_repo: Arc<dyn DeviceRepository>,
    schedule_repo: Arc<dyn ScheduleRepository>,
    job_repo: Arc<dyn JobRepository>,
    matcher: DeviceMatcher,
    resolver: BuildResolver,
}

impl JobCreator {
    pub fn new(
        device_repo: Arc<dyn DeviceRepository>,
        schedule_repo: Arc<dyn ScheduleRepository>,
        job_repo: Arc<dyn JobRepository>,
        matcher: DeviceMatcher,
        resolver: BuildResolver,
    ) -> Self {
        Self {
            device_repo,
            schedule_repo,
            job_repo,
            matcher,
            resolver,
        }
    }

    /// Attempt to create one job for `schedule`. No store mutation happens
    /// unless every required build role resolves and a host qualifies.
    pub async fn create_job(
        &self,
        schedule: &Schedule,
        manual: bool,
        now: DateTime<Utc>,
    ) -> SchedulerResult<JobAttempt> {
        let Some(host_match) = self.matcher.select_host(schedule).await? else {
            debug!(
                schedule = schedule.id,
                test = schedule.test_name.as_str(),
                "no qualifying host"
            );
            return Ok(JobAttempt::NoDevice);
        };

        let device_build = self
            .resolver
            .resolve(
                "device",
                &schedule.manifest_branch,
                &schedule.build_target,
                schedule.require_signed_build,
                now,
            )
            .await?;
        let gsi_build = self
            .resolver
            .resolve("gsi", &schedule.gsi_branch, &schedule.gsi_build_target, false, now)
            .await?;
        let test_build = self
            .resolver
            .resolve(
                "test",
                &schedule.test_branch,
                &schedule.test_build_target,
                false,
                now,
            )
            .await?;

        if !device_build.is_satisfied() || !gsi_build.is_satisfied() || !test_build.is_satisfied() {
            debug!(
                schedule = schedule.id,
                test = schedule.test_name.as_str(),
                "required build not available"
            );
            return Ok(JobAttempt::NoBuild);
        }

        // All requirements met; from here on, mutate. Reserving first makes
        // the devices invisible to every later schedule in this cycle.
        self.device_repo.reserve(&host_match.serials).await?;

        let job = Job {
            id: 0,
            schedule_id: schedule.id,
            test_name: schedule.test_name.clone(),
            hostname: host_match.hostname.clone(),
            device_target: host_match.device_target.clone(),
            serials: host_match.serials.clone(),
            shards: schedule.shards,
            required_device_equipment: schedule.required_device_equipment.clone(),
            required_host_equipment: schedule.required_host_equipment.clone(),
            manifest_branch: schedule.manifest_branch.clone(),
            build_target: schedule.build_target.clone(),
            build_id: device_build.into_build_id(),
            gsi_branch: schedule.gsi_branch.clone(),
            gsi_build_target: schedule.gsi_build_target.clone(),
            gsi_build_id: gsi_build.into_build_id(),
            test_branch: schedule.test_branch.clone(),
            test_build_target: schedule.test_build_target.clone(),
            test_build_id: test_build.into_build_id(),
            status: JobStatus::Ready,
            test_type: compute_test_type(schedule, manual),
            timestamp: now,
        };
        let created = self.job_repo.create(&job).await?;

        let mut updated = schedule.clone();
        updated.children_jobs.push(created.id);
        updated.priority_value = schedule.priority.base_value();
        self.schedule_repo.update(&updated).await?;

        let lab = DeviceTarget::parse(&host_match.device_target)
            .map(|t| t.lab)
            .unwrap_or_default();

        info!(
            schedule = schedule.id,
            test = schedule.test_name.as_str(),
            job = created.id,
            hostname = host_match.hostname.as_str(),
            lab = lab.as_str(),
            "created job"
        );

        Ok(JobAttempt::Created {
            job_id: created.id,
            lab,
        })
    }
}

/// Test-type tag bits for a new job: top-of-tree when the device and
/// system-image branches carry the same release version, OTA when they
/// differ, unknown when a branch name cannot be parsed.
fn compute_test_type(schedule: &Schedule, manual: bool) -> u32 {
    let device_version = branch_version(&schedule.manifest_branch);
    let gsi_version = if schedule.gsi_branch.is_empty() {
        device_version.clone()
    } else {
        branch_version(&schedule.gsi_branch)
    };

    let mut bits = match (device_version, gsi_version) {
        (Some(d), Some(g)) if d == g => test_type::TOT,
        (Some(_), Some(_)) => test_type::OTA,
        _ => test_type::UNKNOWN,
    };
    if schedule.require_signed_build {
        bits |= test_type::SIGNED;
    }
    if manual {
        bits |= test_type::MANUAL;
    }
    bits
}

#[cfg(test)]
mod tests {
    use super::*;
    use labsched_testing_utils::ScheduleBuilder;

    #[test]
    fn test_same_version_is_tot() {
        let schedule = ScheduleBuilder::new(1)
            .with_branches("git_pie-release", "git_pie-gsi", "")
            .build();
        assert_eq!(compute_test_type(&schedule, false), test_type::TOT);
    }

    #[test]
    fn test_different_version_is_ota() {
        let schedule = ScheduleBuilder::new(1)
            .with_branches("git_oc-release", "git_pie-gsi", "")
            .build();
        assert_eq!(compute_test_type(&schedule, false), test_type::OTA);
    }

    #[test]
    fn test_unparseable_branch_is_unknown() {
        let schedule = ScheduleBuilder::new(1)
            .with_branches("??", "git_pie-gsi", "")
            .build();
        assert_eq!(compute_test_type(&schedule, false), test_type::UNKNOWN);
    }

    #[test]
    fn test_empty_gsi_branch_compares_as_tot() {
        let schedule = ScheduleBuilder::new(1)
            .with_branches("git_pie-release", "", "")
            .build();
        assert_eq!(compute_test_type(&schedule, false), test_type::TOT);
    }

    #[test]
    fn test_signed_and_manual_bits() {
        let schedule = ScheduleBuilder::new(1)
            .with_branches("git_pie-release", "git_pie-gsi", "")
            .signed()
            .build();
        let bits = compute_test_type(&schedule, true);
        assert_eq!(
            bits,
            test_type::TOT | test_type::SIGNED | test_type::MANUAL
        );
    }
}
