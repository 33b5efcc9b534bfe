use thiserror::Error;

/// Scheduler error type definitions.
///
/// Only programming and store errors live here. "No device available" and
/// "no build available" are ordinary scheduling outcomes, not errors, and
/// are modeled as enum variants in the dispatcher crate.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("store error: {0}")]
    Store(String),

    #[error("schedule not found: {id}")]
    ScheduleNotFound { id: i64 },

    #[error("job not found: {id}")]
    JobNotFound { id: i64 },

    #[error("invalid schedule data: {0}")]
    InvalidScheduleData(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Unified Result type for the scheduler crates.
pub type SchedulerResult<T> = std::result::Result<T, SchedulerError>;
