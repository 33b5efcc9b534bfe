use std::sync::Arc;

use tracing::{debug, warn};

use labsched_core::SchedulerResult;
use labsched_domain::entities::{DeviceFilter, DeviceState, Schedule, SchedulingStatus};
use labsched_domain::repositories::{DeviceRepository, HostRepository};
use labsched_domain::value_objects::DeviceTarget;

/// A host able to supply a schedule's device requirements, with the
/// concrete serials to reserve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostMatch {
    pub hostname: String,
    /// The "lab/product" target entry that was satisfied.
    pub device_target: String,
    pub serials: Vec<String>,
}

/// Finds the host with the minimal-equipment sufficient device set for one
/// schedule. Read-only: reservation is the orchestrator's job.
pub struct DeviceMatcher {
    device_repo: Arc<dyn DeviceRepository>,
    host_repo: Arc<dyn HostRepository>,
}

impl DeviceMatcher {
    pub fn new(device_repo: Arc<dyn DeviceRepository>, host_repo: Arc<dyn HostRepository>) -> Self {
        Self {
            device_repo,
            host_repo,
        }
    }

    /// Select the (host, device set) pair with the smallest total equipment
    /// footprint across all target entries. `None` means no qualifying host
    /// exists right now; that is an ordinary outcome, not an error.
    pub async fn select_host(&self, schedule: &Schedule) -> SchedulerResult<Option<HostMatch>> {
        let mut best: Option<(HostMatch, usize)> = None;

        for target_entry in &schedule.device_targets {
            let Some(target) = DeviceTarget::parse(target_entry) else {
                warn!(
                    schedule = schedule.id,
                    target = target_entry.as_str(),
                    "skipping malformed device target"
                );
                continue;
            };

            let hosts = self.host_repo.list_by_lab(&target.lab).await?;
            for host in hosts {
                if !schedule
                    .required_host_equipment
                    .is_subset(&host.host_equipment)
                {
                    continue;
                }

                let filter = DeviceFilter {
                    hostname: Some(host.hostname.clone()),
                    scheduling_status: Some(SchedulingStatus::Free),
                    statuses: vec![DeviceState::Fastboot, DeviceState::Online, DeviceState::Ready],
                    product: Some(target.product.clone()),
                    equipment: schedule.required_device_equipment.clone(),
                };
                let mut candidates = self.device_repo.list(&filter).await?;
                if (candidates.len() as u32) < schedule.shards {
                    debug!(
                        schedule = schedule.id,
                        hostname = host.hostname.as_str(),
                        found = candidates.len(),
                        needed = schedule.shards,
                        "host has too few matching devices"
                    );
                    continue;
                }

                // Prefer devices with the fewest extra capabilities so
                // specially-equipped units stay free for jobs that need them.
                candidates.sort_by_key(|d| d.device_equipment.len());
                candidates.truncate(schedule.shards as usize);

                let footprint: usize = candidates.iter().map(|d| d.device_equipment.len()).sum();
                let is_better = match &best {
                    None => true,
                    Some((_, best_footprint)) => footprint < *best_footprint,
                };
                if is_better {
                    best = Some((
                        HostMatch {
                            hostname: host.hostname.clone(),
                            device_target: target_entry.clone(),
                            serials: candidates.into_iter().map(|d| d.serial).collect(),
                        },
                        footprint,
                    ));
                }
            }
        }

        Ok(best.map(|(m, _)| m))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use labsched_testing_utils::{
        DeviceBuilder, HostBuilder, InMemoryDeviceRepository, InMemoryHostRepository,
        ScheduleBuilder,
    };

    fn matcher(
        devices: Vec<labsched_domain::entities::Device>,
        hosts: Vec<labsched_domain::entities::Host>,
    ) -> DeviceMatcher {
        DeviceMatcher::new(
            Arc::new(InMemoryDeviceRepository::with_devices(devices)),
            Arc::new(InMemoryHostRepository::with_hosts(hosts)),
        )
    }

    #[tokio::test]
    async fn test_selects_smallest_equipment_superset() {
        let devices = vec![
            DeviceBuilder::new("SER-A").with_equipment(&["a"]).build(),
            DeviceBuilder::new("SER-B").with_equipment(&["b"]).build(),
            DeviceBuilder::new("SER-AB")
                .with_equipment(&["a", "b"])
                .build(),
        ];
        let hosts = vec![HostBuilder::new("host1").build()];
        let schedule = ScheduleBuilder::new(1).with_device_equipment(&["b"]).build();

        let m = matcher(devices, hosts)
            .select_host(&schedule)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(m.serials, vec!["SER-B".to_string()]);
    }

    #[tokio::test]
    async fn test_no_host_when_too_few_devices() {
        let devices = vec![DeviceBuilder::new("SER-A").build()];
        let hosts = vec![HostBuilder::new("host1").build()];
        let schedule = ScheduleBuilder::new(1).with_shards(2).build();

        let m = matcher(devices, hosts).select_host(&schedule).await.unwrap();
        assert!(m.is_none());
    }

    #[tokio::test]
    async fn test_host_equipment_superset_required() {
        let devices = vec![DeviceBuilder::new("SER-A").build()];
        let hosts = vec![HostBuilder::new("host1").with_equipment(&["ap"]).build()];

        let needs_more = ScheduleBuilder::new(1)
            .with_host_equipment(&["ap", "cellular-sim"])
            .build();
        assert!(matcher(devices.clone(), hosts.clone())
            .select_host(&needs_more)
            .await
            .unwrap()
            .is_none());

        let satisfied = ScheduleBuilder::new(2).with_host_equipment(&["ap"]).build();
        assert!(matcher(devices, hosts)
            .select_host(&satisfied)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_picks_minimal_footprint_across_hosts() {
        let devices = vec![
            DeviceBuilder::new("SER-1")
                .with_hostname("host1")
                .with_equipment(&["x", "y"])
                .build(),
            DeviceBuilder::new("SER-2").with_hostname("host2").build(),
        ];
        let hosts = vec![
            HostBuilder::new("host1").build(),
            HostBuilder::new("host2").build(),
        ];
        let schedule = ScheduleBuilder::new(1).build();

        let m = matcher(devices, hosts)
            .select_host(&schedule)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(m.hostname, "host2");
    }

    #[tokio::test]
    async fn test_ties_broken_by_first_found() {
        let devices = vec![
            DeviceBuilder::new("SER-1").with_hostname("host1").build(),
            DeviceBuilder::new("SER-2").with_hostname("host2").build(),
        ];
        let hosts = vec![
            HostBuilder::new("host1").build(),
            HostBuilder::new("host2").build(),
        ];
        let schedule = ScheduleBuilder::new(1).build();

        let m = matcher(devices, hosts)
            .select_host(&schedule)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(m.hostname, "host1");
    }

    #[tokio::test]
    async fn test_skips_reserved_and_unusable_devices() {
        use labsched_domain::entities::DeviceState;

        let devices = vec![
            DeviceBuilder::new("SER-1").reserved().build(),
            DeviceBuilder::new("SER-2")
                .with_status(DeviceState::Offline)
                .build(),
        ];
        let hosts = vec![HostBuilder::new("host1").build()];
        let schedule = ScheduleBuilder::new(1).build();

        assert!(matcher(devices, hosts)
            .select_host(&schedule)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_malformed_target_skipped_not_fatal() {
        let devices = vec![DeviceBuilder::new("SER-1").build()];
        let hosts = vec![HostBuilder::new("host1").build()];
        let schedule = ScheduleBuilder::new(1)
            .with_targets(&["malformed", "lab-a/walleye"])
            .build();

        let m = matcher(devices, hosts)
            .select_host(&schedule)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(m.device_target, "lab-a/walleye");
    }

    #[tokio::test]
    async fn test_product_match_case_insensitive() {
        let devices = vec![DeviceBuilder::new("SER-1").with_product("Walleye").build()];
        let hosts = vec![HostBuilder::new("host1").build()];
        let schedule = ScheduleBuilder::new(1)
            .with_targets(&["lab-a/WALLEYE"])
            .build();

        assert!(matcher(devices, hosts)
            .select_host(&schedule)
            .await
            .unwrap()
            .is_some());
    }
}
