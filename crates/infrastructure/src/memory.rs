//! In-memory entity store.
//!
//! Backs the embedded binary and the test suites. Each repository is an
//! `Arc<Mutex<..>>` map so clones share state, mirroring how a handle to
//! the real store would behave.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use labsched_core::{SchedulerError, SchedulerResult};
use labsched_domain::entities::{
    Build, BuildQuery, Device, DeviceFilter, Host, Job, Schedule, SchedulingStatus,
};
use labsched_domain::repositories::{
    BuildRepository, DeviceRepository, HostRepository, JobRepository, ScheduleRepository,
};

#[derive(Debug, Clone, Default)]
pub struct InMemoryDeviceRepository {
    devices: Arc<Mutex<HashMap<String, Device>>>,
}

impl InMemoryDeviceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_devices(devices: Vec<Device>) -> Self {
        let map = devices
            .into_iter()
            .map(|d| (d.serial.clone(), d))
            .collect();
        Self {
            devices: Arc::new(Mutex::new(map)),
        }
    }

    pub fn insert(&self, device: Device) {
        self.devices
            .lock()
            .unwrap()
            .insert(device.serial.clone(), device);
    }

    pub fn release(&self, serial: &str) {
        if let Some(device) = self.devices.lock().unwrap().get_mut(serial) {
            device.scheduling_status = SchedulingStatus::Free;
        }
    }

    pub fn all(&self) -> Vec<Device> {
        self.devices.lock().unwrap().values().cloned().collect()
    }
}

#[async_trait]
impl DeviceRepository for InMemoryDeviceRepository {
    async fn list(&self, filter: &DeviceFilter) -> SchedulerResult<Vec<Device>> {
        let devices = self.devices.lock().unwrap();
        let mut matched: Vec<Device> = devices
            .values()
            .filter(|d| filter.matches(d))
            .cloned()
            .collect();
        // Deterministic order; the real store returns rows sorted by key.
        matched.sort_by(|a, b| a.serial.cmp(&b.serial));
        Ok(matched)
    }

    async fn get(&self, serial: &str) -> SchedulerResult<Option<Device>> {
        Ok(self.devices.lock().unwrap().get(serial).cloned())
    }

    async fn reserve(&self, serials: &[String]) -> SchedulerResult<()> {
        let mut devices = self.devices.lock().unwrap();
        for serial in serials {
            match devices.get(serial) {
                None => {
                    return Err(SchedulerError::Store(format!(
                        "cannot reserve unknown device {serial}"
                    )))
                }
                Some(d) if d.scheduling_status != SchedulingStatus::Free => {
                    return Err(SchedulerError::Store(format!(
                        "cannot reserve device {serial}: not free"
                    )))
                }
                Some(_) => {}
            }
        }
        for serial in serials {
            if let Some(device) = devices.get_mut(serial) {
                device.scheduling_status = SchedulingStatus::Reserved;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryHostRepository {
    hosts: Arc<Mutex<Vec<Host>>>,
}

impl InMemoryHostRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hosts(hosts: Vec<Host>) -> Self {
        Self {
            hosts: Arc::new(Mutex::new(hosts)),
        }
    }

    pub fn insert(&self, host: Host) {
        self.hosts.lock().unwrap().push(host);
    }
}

#[async_trait]
impl HostRepository for InMemoryHostRepository {
    async fn list_by_lab(&self, lab_name: &str) -> SchedulerResult<Vec<Host>> {
        let hosts = self.hosts.lock().unwrap();
        Ok(hosts
            .iter()
            .filter(|h| h.lab_name == lab_name)
            .cloned()
            .collect())
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryScheduleRepository {
    schedules: Arc<Mutex<HashMap<i64, Schedule>>>,
}

impl InMemoryScheduleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schedules(schedules: Vec<Schedule>) -> Self {
        let map = schedules.into_iter().map(|s| (s.id, s)).collect();
        Self {
            schedules: Arc::new(Mutex::new(map)),
        }
    }

    pub fn insert(&self, schedule: Schedule) {
        self.schedules.lock().unwrap().insert(schedule.id, schedule);
    }
}

#[async_trait]
impl ScheduleRepository for InMemoryScheduleRepository {
    async fn list_active(&self) -> SchedulerResult<Vec<Schedule>> {
        let schedules = self.schedules.lock().unwrap();
        let mut active: Vec<Schedule> = schedules
            .values()
            .filter(|s| !s.suspended)
            .cloned()
            .collect();
        active.sort_by_key(|s| s.id);
        Ok(active)
    }

    async fn get(&self, id: i64) -> SchedulerResult<Option<Schedule>> {
        Ok(self.schedules.lock().unwrap().get(&id).cloned())
    }

    async fn update(&self, schedule: &Schedule) -> SchedulerResult<()> {
        let mut schedules = self.schedules.lock().unwrap();
        if !schedules.contains_key(&schedule.id) {
            return Err(SchedulerError::ScheduleNotFound { id: schedule.id });
        }
        schedules.insert(schedule.id, schedule.clone());
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct InMemoryJobRepository {
    jobs: Arc<Mutex<HashMap<i64, Job>>>,
    next_id: Arc<Mutex<i64>>,
}

impl InMemoryJobRepository {
    pub fn new() -> Self {
        Self {
            jobs: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(Mutex::new(1)),
        }
    }

    pub fn with_jobs(jobs: Vec<Job>) -> Self {
        let max_id = jobs.iter().map(|j| j.id).max().unwrap_or(0);
        let map = jobs.into_iter().map(|j| (j.id, j)).collect();
        Self {
            jobs: Arc::new(Mutex::new(map)),
            next_id: Arc::new(Mutex::new(max_id + 1)),
        }
    }

    pub fn count(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }

    pub fn update(&self, job: &Job) {
        self.jobs.lock().unwrap().insert(job.id, job.clone());
    }

    pub fn all(&self) -> Vec<Job> {
        self.jobs.lock().unwrap().values().cloned().collect()
    }
}

impl Default for InMemoryJobRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn create(&self, job: &Job) -> SchedulerResult<Job> {
        let mut jobs = self.jobs.lock().unwrap();
        let mut next_id = self.next_id.lock().unwrap();

        let mut created = job.clone();
        created.id = *next_id;
        *next_id += 1;

        jobs.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get(&self, id: i64) -> SchedulerResult<Option<Job>> {
        Ok(self.jobs.lock().unwrap().get(&id).cloned())
    }

    async fn list_by_schedule(&self, schedule_id: i64) -> SchedulerResult<Vec<Job>> {
        let jobs = self.jobs.lock().unwrap();
        let mut matched: Vec<Job> = jobs
            .values()
            .filter(|j| j.schedule_id == schedule_id)
            .cloned()
            .collect();
        matched.sort_by_key(|j| j.id);
        Ok(matched)
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryBuildRepository {
    builds: Arc<Mutex<Vec<Build>>>,
}

impl InMemoryBuildRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builds(builds: Vec<Build>) -> Self {
        Self {
            builds: Arc::new(Mutex::new(builds)),
        }
    }

    pub fn insert(&self, build: Build) {
        self.builds.lock().unwrap().push(build);
    }

    pub fn refresh_timestamps(&self, now: chrono::DateTime<chrono::Utc>) {
        for build in self.builds.lock().unwrap().iter_mut() {
            build.timestamp = now;
        }
    }
}

#[async_trait]
impl BuildRepository for InMemoryBuildRepository {
    async fn latest(&self, query: &BuildQuery) -> SchedulerResult<Option<Build>> {
        let builds = self.builds.lock().unwrap();
        Ok(builds
            .iter()
            .filter(|b| query.matches(b))
            .max_by(|a, b| a.build_id.cmp(&b.build_id))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use labsched_domain::entities::DeviceState;

    fn device(serial: &str) -> Device {
        Device {
            serial: serial.to_string(),
            hostname: "host1".to_string(),
            product: "walleye".to_string(),
            device_equipment: Default::default(),
            scheduling_status: SchedulingStatus::Free,
            status: DeviceState::Online,
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_reserve_marks_all_devices() {
        let repo = InMemoryDeviceRepository::with_devices(vec![device("a"), device("b")]);
        repo.reserve(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();

        for serial in ["a", "b"] {
            let d = repo.get(serial).await.unwrap().unwrap();
            assert_eq!(d.scheduling_status, SchedulingStatus::Reserved);
        }
    }

    #[tokio::test]
    async fn test_reserve_is_all_or_nothing() {
        let repo = InMemoryDeviceRepository::with_devices(vec![device("a")]);
        let result = repo.reserve(&["a".to_string(), "missing".to_string()]).await;
        assert!(matches!(result, Err(SchedulerError::Store(_))));

        // The present device must not have been touched.
        let d = repo.get("a").await.unwrap().unwrap();
        assert_eq!(d.scheduling_status, SchedulingStatus::Free);
    }

    #[tokio::test]
    async fn test_latest_build_picks_highest_id() {
        let now = Utc::now();
        let mk = |id: &str, signed: bool| Build {
            artifact_type: "device".to_string(),
            manifest_branch: "git_pie-release".to_string(),
            build_target: "walleye-userdebug".to_string(),
            build_type: "submitted".to_string(),
            build_id: id.to_string(),
            signed,
            timestamp: now,
        };
        let repo =
            InMemoryBuildRepository::with_builds(vec![mk("100", false), mk("300", false), mk("200", true)]);

        let query = BuildQuery {
            artifact_type: "device".to_string(),
            manifest_branch: "git_pie-release".to_string(),
            build_target: "walleye-userdebug".to_string(),
            signed_only: false,
            newer_than: now - chrono::Duration::hours(1),
        };
        let build = repo.latest(&query).await.unwrap().unwrap();
        assert_eq!(build.build_id, "300");

        let signed_query = BuildQuery {
            signed_only: true,
            ..query
        };
        let build = repo.latest(&signed_query).await.unwrap().unwrap();
        assert_eq!(build.build_id, "200");
    }
}
