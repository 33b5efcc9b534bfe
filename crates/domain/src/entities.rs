use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{DeviceTarget, Priority};

/// Whether a device is currently claimable by the scheduler.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum SchedulingStatus {
    Free,
    Reserved,
}

/// Reported device state from the lab inventory sync.
///
/// Only `Online`, `Fastboot` and `Ready` devices are usable for new jobs;
/// everything else is visible but never matched.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeviceState {
    Online,
    Fastboot,
    Ready,
    Offline,
    NoResponse,
    Unknown,
}

impl DeviceState {
    pub fn is_schedulable(&self) -> bool {
        matches!(
            self,
            DeviceState::Online | DeviceState::Fastboot | DeviceState::Ready
        )
    }
}

/// One physical device in a lab host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub serial: String,
    pub hostname: String,
    pub product: String,
    pub device_equipment: BTreeSet<String>,
    pub scheduling_status: SchedulingStatus,
    pub status: DeviceState,
    pub updated_at: DateTime<Utc>,
}

impl Device {
    pub fn is_free(&self) -> bool {
        self.scheduling_status == SchedulingStatus::Free && self.status.is_schedulable()
    }
}

/// One host machine inside a lab. Multiple hosts may share a lab name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Host {
    pub lab_name: String,
    pub hostname: String,
    pub host_equipment: BTreeSet<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum JobStatus {
    Ready,
    Leased,
    Running,
    Complete,
    InfraErr,
    Expired,
    BootupErr,
}

impl JobStatus {
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            JobStatus::Complete | JobStatus::InfraErr | JobStatus::Expired | JobStatus::BootupErr
        )
    }
}

/// A recurring test-run definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub id: i64,
    pub test_name: String,
    /// Each entry is a "lab/product" pair, tried in order.
    pub device_targets: Vec<String>,
    pub required_device_equipment: BTreeSet<String>,
    pub required_host_equipment: BTreeSet<String>,
    pub shards: u32,
    pub priority: Priority,
    /// Effective (aged) priority value; lower means scheduled sooner.
    pub priority_value: u32,
    pub period_minutes: i64,
    pub suspended: bool,
    pub updated_at: DateTime<Utc>,
    /// Job ids created from this schedule, most recent last.
    pub children_jobs: Vec<i64>,
    /// Consecutive boot-up failures of this schedule's jobs.
    pub error_count: u32,

    pub manifest_branch: String,
    pub build_target: String,
    pub build_type: String,
    pub require_signed_build: bool,
    pub gsi_branch: String,
    pub gsi_build_target: String,
    pub test_branch: String,
    pub test_build_target: String,
}

impl Schedule {
    pub fn has_children(&self) -> bool {
        !self.children_jobs.is_empty()
    }

    pub fn latest_child_job(&self) -> Option<i64> {
        self.children_jobs.last().copied()
    }

    /// Product group key for priority aging: the product of the first
    /// parseable device target, lowercased. Schedules without a parseable
    /// target fall into the empty group.
    pub fn product_group(&self) -> String {
        self.device_targets
            .iter()
            .find_map(|t| DeviceTarget::parse(t))
            .map(|t| t.product.to_lowercase())
            .unwrap_or_default()
    }
}

/// One concrete, device-reserved instantiation of a schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: i64,
    pub schedule_id: i64,
    pub test_name: String,
    pub hostname: String,
    /// The "lab/product" target entry the matcher satisfied.
    pub device_target: String,
    /// Reserved device serials, length equals the parent schedule's shards.
    pub serials: Vec<String>,
    pub shards: u32,
    pub required_device_equipment: BTreeSet<String>,
    pub required_host_equipment: BTreeSet<String>,

    pub manifest_branch: String,
    pub build_target: String,
    pub build_id: String,
    pub gsi_branch: String,
    pub gsi_build_target: String,
    pub gsi_build_id: String,
    pub test_branch: String,
    pub test_build_target: String,
    pub test_build_id: String,

    pub status: JobStatus,
    /// Test-type tag bitfield, see `value_objects::test_type`.
    pub test_type: u32,
    pub timestamp: DateTime<Utc>,
}

/// One row in the build-metadata store, read-only to the scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Build {
    pub artifact_type: String,
    pub manifest_branch: String,
    pub build_target: String,
    pub build_type: String,
    pub build_id: String,
    pub signed: bool,
    pub timestamp: DateTime<Utc>,
}

/// Filter for device queries against the entity store.
///
/// `statuses` empty means any state; `equipment` is a superset requirement,
/// never an exact match.
#[derive(Debug, Clone, Default)]
pub struct DeviceFilter {
    pub hostname: Option<String>,
    pub scheduling_status: Option<SchedulingStatus>,
    pub statuses: Vec<DeviceState>,
    /// Compared case-insensitively.
    pub product: Option<String>,
    pub equipment: BTreeSet<String>,
}

impl DeviceFilter {
    pub fn matches(&self, device: &Device) -> bool {
        if let Some(hostname) = &self.hostname {
            if device.hostname != *hostname {
                return false;
            }
        }
        if let Some(scheduling_status) = self.scheduling_status {
            if device.scheduling_status != scheduling_status {
                return false;
            }
        }
        if !self.statuses.is_empty() && !self.statuses.contains(&device.status) {
            return false;
        }
        if let Some(product) = &self.product {
            if !device.product.eq_ignore_ascii_case(product) {
                return false;
            }
        }
        self.equipment.is_subset(&device.device_equipment)
    }
}

/// Query for the newest build matching a schedule's branch and target.
#[derive(Debug, Clone)]
pub struct BuildQuery {
    pub artifact_type: String,
    pub manifest_branch: String,
    pub build_target: String,
    pub signed_only: bool,
    pub newer_than: DateTime<Utc>,
}

impl BuildQuery {
    pub fn matches(&self, build: &Build) -> bool {
        build.artifact_type == self.artifact_type
            && build.manifest_branch == self.manifest_branch
            && build.build_target == self.build_target
            && (!self.signed_only || build.signed)
            && build.timestamp > self.newer_than
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(status: DeviceState, scheduling: SchedulingStatus) -> Device {
        Device {
            serial: "SER001".to_string(),
            hostname: "host1".to_string(),
            product: "Walleye".to_string(),
            device_equipment: ["cable-a".to_string()].into_iter().collect(),
            scheduling_status: scheduling,
            status,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_device_state_schedulable() {
        assert!(DeviceState::Online.is_schedulable());
        assert!(DeviceState::Fastboot.is_schedulable());
        assert!(DeviceState::Ready.is_schedulable());
        assert!(!DeviceState::Offline.is_schedulable());
        assert!(!DeviceState::NoResponse.is_schedulable());
        assert!(!DeviceState::Unknown.is_schedulable());
    }

    #[test]
    fn test_device_filter_product_case_insensitive() {
        let filter = DeviceFilter {
            product: Some("walleye".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&device(DeviceState::Online, SchedulingStatus::Free)));
    }

    #[test]
    fn test_device_filter_equipment_superset() {
        let mut filter = DeviceFilter::default();
        filter.equipment.insert("cable-a".to_string());
        assert!(filter.matches(&device(DeviceState::Online, SchedulingStatus::Free)));

        filter.equipment.insert("cable-b".to_string());
        assert!(!filter.matches(&device(DeviceState::Online, SchedulingStatus::Free)));
    }

    #[test]
    fn test_device_filter_scheduling_status() {
        let filter = DeviceFilter {
            scheduling_status: Some(SchedulingStatus::Free),
            ..Default::default()
        };
        assert!(filter.matches(&device(DeviceState::Online, SchedulingStatus::Free)));
        assert!(!filter.matches(&device(DeviceState::Online, SchedulingStatus::Reserved)));
    }

    #[test]
    fn test_product_group_uses_first_parseable_target() {
        let mut schedule = Schedule {
            id: 1,
            test_name: "vts".to_string(),
            device_targets: vec!["broken-entry".to_string(), "lab-a/Walleye".to_string()],
            required_device_equipment: BTreeSet::new(),
            required_host_equipment: BTreeSet::new(),
            shards: 1,
            priority: Priority::Medium,
            priority_value: Priority::Medium.base_value(),
            period_minutes: 1440,
            suspended: false,
            updated_at: Utc::now(),
            children_jobs: vec![],
            error_count: 0,
            manifest_branch: String::new(),
            build_target: String::new(),
            build_type: String::new(),
            require_signed_build: false,
            gsi_branch: String::new(),
            gsi_build_target: String::new(),
            test_branch: String::new(),
            test_build_target: String::new(),
        };
        assert_eq!(schedule.product_group(), "walleye");

        schedule.device_targets = vec!["broken-entry".to_string()];
        assert_eq!(schedule.product_group(), "");
    }
}
