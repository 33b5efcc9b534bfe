use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use labsched_core::AppConfig;
use labsched_dispatcher::{
    BuildResolver, DeviceMatcher, JobAttempt, JobCreator, ScheduleFilter, ScheduleRunner, Trigger,
};
use labsched_infrastructure::load_seed_file;

/// Embedded application: the scheduling core wired to an in-memory store
/// seeded from a JSON file. Deployments against the real entity store
/// swap the repositories behind the same traits.
pub struct Application {
    runner: ScheduleRunner,
}

impl Application {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let seed_path = config
            .store
            .seed_path
            .as_deref()
            .context("store.seed_path must be set for the embedded store")?;
        let store = load_seed_file(Path::new(seed_path))
            .with_context(|| format!("failed to load store seed from {seed_path}"))?;

        let devices = Arc::new(store.devices);
        let hosts = Arc::new(store.hosts);
        let schedules = Arc::new(store.schedules);
        let jobs = Arc::new(store.jobs);
        let builds = Arc::new(store.builds);

        let matcher = DeviceMatcher::new(devices.clone(), hosts);
        let resolver = BuildResolver::new(
            builds,
            config.scheduler.storage_backend,
            config.scheduler.build_stale_hours,
        );
        let creator = JobCreator::new(devices, schedules.clone(), jobs.clone(), matcher, resolver);
        let filter = ScheduleFilter::new(jobs, config.scheduler.clone());
        let runner = ScheduleRunner::new(schedules, filter, creator);

        Ok(Self { runner })
    }

    pub async fn run_once(&self, trigger: Trigger) -> Result<()> {
        let outcomes = self.runner.run_cycle(trigger, Utc::now()).await?;

        let created = outcomes
            .iter()
            .filter(|o| matches!(o.result, JobAttempt::Created { .. }))
            .count();
        let no_device = outcomes
            .iter()
            .filter(|o| o.result == JobAttempt::NoDevice)
            .count();
        let no_build = outcomes
            .iter()
            .filter(|o| o.result == JobAttempt::NoBuild)
            .count();
        info!(
            attempted = outcomes.len(),
            created, no_device, no_build, "scheduling cycle complete"
        );
        Ok(())
    }
}
