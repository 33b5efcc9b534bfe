pub mod config;
pub mod errors;
pub mod logging;

pub use config::{AppConfig, LogConfig, SchedulerConfig, StorageBackend, StoreConfig};
pub use errors::{SchedulerError, SchedulerResult};
pub use logging::init_logging;
