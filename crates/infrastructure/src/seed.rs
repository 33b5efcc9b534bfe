//! JSON seed loading for the embedded in-memory store.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use labsched_core::{SchedulerError, SchedulerResult};
use labsched_domain::entities::{Build, Device, Host, Job, Schedule};

use crate::memory::{
    InMemoryBuildRepository, InMemoryDeviceRepository, InMemoryHostRepository,
    InMemoryJobRepository, InMemoryScheduleRepository,
};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub devices: Vec<Device>,
    #[serde(default)]
    pub hosts: Vec<Host>,
    #[serde(default)]
    pub schedules: Vec<Schedule>,
    #[serde(default)]
    pub jobs: Vec<Job>,
    #[serde(default)]
    pub builds: Vec<Build>,
}

pub struct SeededStore {
    pub devices: InMemoryDeviceRepository,
    pub hosts: InMemoryHostRepository,
    pub schedules: InMemoryScheduleRepository,
    pub jobs: InMemoryJobRepository,
    pub builds: InMemoryBuildRepository,
}

/// Read a JSON seed file and populate a fresh in-memory store from it.
pub fn load_seed_file(path: &Path) -> SchedulerResult<SeededStore> {
    let content = fs::read_to_string(path)
        .map_err(|e| SchedulerError::Store(format!("failed to read seed file: {e}")))?;
    let seed: SeedData = serde_json::from_str(&content)
        .map_err(|e| SchedulerError::Store(format!("invalid seed file: {e}")))?;

    info!(
        devices = seed.devices.len(),
        hosts = seed.hosts.len(),
        schedules = seed.schedules.len(),
        jobs = seed.jobs.len(),
        builds = seed.builds.len(),
        "loaded store seed"
    );

    Ok(SeededStore {
        devices: InMemoryDeviceRepository::with_devices(seed.devices),
        hosts: InMemoryHostRepository::with_hosts(seed.hosts),
        schedules: InMemoryScheduleRepository::with_schedules(seed.schedules),
        jobs: InMemoryJobRepository::with_jobs(seed.jobs),
        builds: InMemoryBuildRepository::with_builds(seed.builds),
    })
}
