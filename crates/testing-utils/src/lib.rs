//! Shared test data builders and store helpers.

pub mod builders;

pub use builders::{BuildBuilder, DeviceBuilder, HostBuilder, JobBuilder, ScheduleBuilder};
// Tests run against the same in-memory store the embedded binary uses.
pub use labsched_infrastructure::{
    InMemoryBuildRepository, InMemoryDeviceRepository, InMemoryHostRepository,
    InMemoryJobRepository, InMemoryScheduleRepository,
};
