//! Entity-store abstractions.
//!
//! The persistent store for devices, hosts, schedules, jobs and builds is an
//! external collaborator; these traits define exactly the operations the
//! scheduling core needs from it.

use async_trait::async_trait;

use crate::entities::{Build, BuildQuery, Device, DeviceFilter, Host, Job, Schedule};
use labsched_core::SchedulerResult;

#[async_trait]
pub trait DeviceRepository: Send + Sync {
    async fn list(&self, filter: &DeviceFilter) -> SchedulerResult<Vec<Device>>;
    async fn get(&self, serial: &str) -> SchedulerResult<Option<Device>>;
    /// Mark every listed device reserved in one atomic multi-record write.
    /// Fails without partial effect if any serial is missing or not free.
    async fn reserve(&self, serials: &[String]) -> SchedulerResult<()>;
}

#[async_trait]
pub trait HostRepository: Send + Sync {
    async fn list_by_lab(&self, lab_name: &str) -> SchedulerResult<Vec<Host>>;
}

#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    /// All non-suspended schedules.
    async fn list_active(&self) -> SchedulerResult<Vec<Schedule>>;
    async fn get(&self, id: i64) -> SchedulerResult<Option<Schedule>>;
    async fn update(&self, schedule: &Schedule) -> SchedulerResult<()>;
}

#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Persist a new job; the returned copy carries the assigned id.
    async fn create(&self, job: &Job) -> SchedulerResult<Job>;
    async fn get(&self, id: i64) -> SchedulerResult<Option<Job>>;
    async fn list_by_schedule(&self, schedule_id: i64) -> SchedulerResult<Vec<Job>>;
}

#[async_trait]
pub trait BuildRepository: Send + Sync {
    /// The matching build with the highest build id, or None.
    async fn latest(&self, query: &BuildQuery) -> SchedulerResult<Option<Build>>;
}
