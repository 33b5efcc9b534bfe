//! Scheduling core: device matching, cycle filtering, priority aging and
//! job creation.
//!
//! One call to [`cycle::ScheduleRunner::run_cycle`] processes every eligible
//! schedule sequentially against the entity store; the external trigger is
//! responsible for serializing invocations.

pub mod backoff;
pub mod builds;
pub mod cycle;
pub mod filter;
pub mod matcher;
pub mod orchestrator;

pub use builds::{BuildResolution, BuildResolver};
pub use cycle::{ScheduleOutcome, ScheduleRunner, Trigger};
pub use filter::ScheduleFilter;
pub use matcher::{DeviceMatcher, HostMatch};
pub use orchestrator::{JobAttempt, JobCreator};
