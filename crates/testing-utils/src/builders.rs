//! Builder patterns for creating test entities with sensible defaults.

use chrono::Utc;

use labsched_domain::entities::{
    Build, Device, DeviceState, Host, Job, JobStatus, Schedule, SchedulingStatus,
};
use labsched_domain::value_objects::Priority;

pub struct DeviceBuilder {
    device: Device,
}

impl DeviceBuilder {
    pub fn new(serial: &str) -> Self {
        Self {
            device: Device {
                serial: serial.to_string(),
                hostname: "host1".to_string(),
                product: "walleye".to_string(),
                device_equipment: Default::default(),
                scheduling_status: SchedulingStatus::Free,
                status: DeviceState::Online,
                updated_at: Utc::now(),
            },
        }
    }

    pub fn with_hostname(mut self, hostname: &str) -> Self {
        self.device.hostname = hostname.to_string();
        self
    }

    pub fn with_product(mut self, product: &str) -> Self {
        self.device.product = product.to_string();
        self
    }

    pub fn with_equipment(mut self, equipment: &[&str]) -> Self {
        self.device.device_equipment = equipment.iter().map(|e| e.to_string()).collect();
        self
    }

    pub fn with_status(mut self, status: DeviceState) -> Self {
        self.device.status = status;
        self
    }

    pub fn reserved(mut self) -> Self {
        self.device.scheduling_status = SchedulingStatus::Reserved;
        self
    }

    pub fn build(self) -> Device {
        self.device
    }
}

pub struct HostBuilder {
    host: Host,
}

impl HostBuilder {
    pub fn new(hostname: &str) -> Self {
        Self {
            host: Host {
                lab_name: "lab-a".to_string(),
                hostname: hostname.to_string(),
                host_equipment: Default::default(),
            },
        }
    }

    pub fn with_lab(mut self, lab_name: &str) -> Self {
        self.host.lab_name = lab_name.to_string();
        self
    }

    pub fn with_equipment(mut self, equipment: &[&str]) -> Self {
        self.host.host_equipment = equipment.iter().map(|e| e.to_string()).collect();
        self
    }

    pub fn build(self) -> Host {
        self.host
    }
}

pub struct ScheduleBuilder {
    schedule: Schedule,
}

impl ScheduleBuilder {
    pub fn new(id: i64) -> Self {
        Self {
            schedule: Schedule {
                id,
                test_name: "vts/vts".to_string(),
                device_targets: vec!["lab-a/walleye".to_string()],
                required_device_equipment: Default::default(),
                required_host_equipment: Default::default(),
                shards: 1,
                priority: Priority::Medium,
                priority_value: Priority::Medium.base_value(),
                period_minutes: 1440,
                suspended: false,
                updated_at: Utc::now(),
                children_jobs: vec![],
                error_count: 0,
                manifest_branch: "git_pie-release".to_string(),
                build_target: "walleye-userdebug".to_string(),
                build_type: "submitted".to_string(),
                require_signed_build: false,
                gsi_branch: String::new(),
                gsi_build_target: String::new(),
                test_branch: String::new(),
                test_build_target: String::new(),
            },
        }
    }

    pub fn with_test_name(mut self, test_name: &str) -> Self {
        self.schedule.test_name = test_name.to_string();
        self
    }

    pub fn with_targets(mut self, targets: &[&str]) -> Self {
        self.schedule.device_targets = targets.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_device_equipment(mut self, equipment: &[&str]) -> Self {
        self.schedule.required_device_equipment =
            equipment.iter().map(|e| e.to_string()).collect();
        self
    }

    pub fn with_host_equipment(mut self, equipment: &[&str]) -> Self {
        self.schedule.required_host_equipment = equipment.iter().map(|e| e.to_string()).collect();
        self
    }

    pub fn with_shards(mut self, shards: u32) -> Self {
        self.schedule.shards = shards;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.schedule.priority = priority;
        self.schedule.priority_value = priority.base_value();
        self
    }

    pub fn with_priority_value(mut self, priority_value: u32) -> Self {
        self.schedule.priority_value = priority_value;
        self
    }

    pub fn with_period_minutes(mut self, period_minutes: i64) -> Self {
        self.schedule.period_minutes = period_minutes;
        self
    }

    pub fn with_updated_at(mut self, updated_at: chrono::DateTime<Utc>) -> Self {
        self.schedule.updated_at = updated_at;
        self
    }

    pub fn with_children_jobs(mut self, jobs: &[i64]) -> Self {
        self.schedule.children_jobs = jobs.to_vec();
        self
    }

    pub fn with_error_count(mut self, error_count: u32) -> Self {
        self.schedule.error_count = error_count;
        self
    }

    pub fn with_branches(mut self, manifest: &str, gsi: &str, test: &str) -> Self {
        self.schedule.manifest_branch = manifest.to_string();
        self.schedule.gsi_branch = gsi.to_string();
        self.schedule.test_branch = test.to_string();
        self
    }

    pub fn with_gsi_target(mut self, target: &str) -> Self {
        self.schedule.gsi_build_target = target.to_string();
        self
    }

    pub fn with_test_target(mut self, target: &str) -> Self {
        self.schedule.test_build_target = target.to_string();
        self
    }

    pub fn signed(mut self) -> Self {
        self.schedule.require_signed_build = true;
        self
    }

    pub fn suspended(mut self) -> Self {
        self.schedule.suspended = true;
        self
    }

    pub fn build(self) -> Schedule {
        self.schedule
    }
}

pub struct JobBuilder {
    job: Job,
}

impl JobBuilder {
    pub fn new(id: i64, schedule_id: i64) -> Self {
        Self {
            job: Job {
                id,
                schedule_id,
                test_name: "vts/vts".to_string(),
                hostname: "host1".to_string(),
                device_target: "lab-a/walleye".to_string(),
                serials: vec!["SER001".to_string()],
                shards: 1,
                required_device_equipment: Default::default(),
                required_host_equipment: Default::default(),
                manifest_branch: "git_pie-release".to_string(),
                build_target: "walleye-userdebug".to_string(),
                build_id: "100".to_string(),
                gsi_branch: String::new(),
                gsi_build_target: String::new(),
                gsi_build_id: String::new(),
                test_branch: String::new(),
                test_build_target: String::new(),
                test_build_id: String::new(),
                status: JobStatus::Ready,
                test_type: 0,
                timestamp: Utc::now(),
            },
        }
    }

    pub fn with_status(mut self, status: JobStatus) -> Self {
        self.job.status = status;
        self
    }

    pub fn with_timestamp(mut self, timestamp: chrono::DateTime<Utc>) -> Self {
        self.job.timestamp = timestamp;
        self
    }

    pub fn build(self) -> Job {
        self.job
    }
}

pub struct BuildBuilder {
    build: Build,
}

impl BuildBuilder {
    pub fn new(build_id: &str) -> Self {
        Self {
            build: Build {
                artifact_type: "device".to_string(),
                manifest_branch: "git_pie-release".to_string(),
                build_target: "walleye-userdebug".to_string(),
                build_type: "submitted".to_string(),
                build_id: build_id.to_string(),
                signed: false,
                timestamp: Utc::now(),
            },
        }
    }

    pub fn with_artifact_type(mut self, artifact_type: &str) -> Self {
        self.build.artifact_type = artifact_type.to_string();
        self
    }

    pub fn with_branch(mut self, manifest_branch: &str) -> Self {
        self.build.manifest_branch = manifest_branch.to_string();
        self
    }

    pub fn with_target(mut self, build_target: &str) -> Self {
        self.build.build_target = build_target.to_string();
        self
    }

    pub fn with_timestamp(mut self, timestamp: chrono::DateTime<Utc>) -> Self {
        self.build.timestamp = timestamp;
        self
    }

    pub fn signed(mut self) -> Self {
        self.build.signed = true;
        self
    }

    pub fn build(self) -> Build {
        self.build
    }
}
