use serde::{Deserialize, Serialize};

use crate::errors::{SchedulerError, SchedulerResult};

/// Where build artifacts for a schedule are tracked.
///
/// `BuildStore` means the internal build-metadata store is queried for the
/// newest matching build id. `Bucket` means builds live in an external
/// bucket and are fetched later by the execution layer, so resolution is
/// deferred at scheduling time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageBackend {
    BuildStore,
    Bucket,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Schedules untouched for longer than this are skipped entirely.
    pub schedule_stale_hours: i64,
    /// Builds older than this are never picked for a new job.
    pub build_stale_hours: i64,
    /// Retry interval forced onto a schedule whose last job hit a boot-up
    /// error, regardless of its configured period.
    pub boot_retry_minutes: i64,
    pub storage_backend: StorageBackend,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            schedule_stale_hours: 72,
            build_stale_hours: 72,
            boot_retry_minutes: 60,
            storage_backend: StorageBackend::BuildStore,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// JSON seed file loaded into the embedded in-memory store at startup.
    pub seed_path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

impl AppConfig {
    /// Load configuration from an optional TOML file merged with
    /// `LABSCHED__`-prefixed environment variables. Missing file is fine
    /// when no explicit path was given; defaults apply.
    pub fn load(config_path: Option<&str>) -> SchedulerResult<Self> {
        let mut builder = config::Config::builder();

        match config_path {
            Some(path) => {
                builder =
                    builder.add_source(config::File::from(std::path::Path::new(path)).required(true));
            }
            None => {
                builder =
                    builder.add_source(config::File::with_name("config/labsched").required(false));
            }
        }

        builder = builder.add_source(
            config::Environment::with_prefix("LABSCHED")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| SchedulerError::Configuration(format!("failed to load config: {e}")))?;

        let app_config: AppConfig = settings
            .try_deserialize()
            .map_err(|e| SchedulerError::Configuration(format!("invalid config: {e}")))?;

        app_config.validate()?;
        Ok(app_config)
    }

    fn validate(&self) -> SchedulerResult<()> {
        if self.scheduler.schedule_stale_hours <= 0 {
            return Err(SchedulerError::Configuration(
                "scheduler.schedule_stale_hours must be positive".to_string(),
            ));
        }
        if self.scheduler.build_stale_hours <= 0 {
            return Err(SchedulerError::Configuration(
                "scheduler.build_stale_hours must be positive".to_string(),
            ));
        }
        if self.scheduler.boot_retry_minutes <= 0 {
            return Err(SchedulerError::Configuration(
                "scheduler.boot_retry_minutes must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.scheduler.schedule_stale_hours, 72);
        assert_eq!(config.scheduler.build_stale_hours, 72);
        assert_eq!(config.scheduler.boot_retry_minutes, 60);
        assert_eq!(config.scheduler.storage_backend, StorageBackend::BuildStore);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(
            file,
            r#"
[log]
level = "debug"
format = "json"

[scheduler]
schedule_stale_hours = 48
build_stale_hours = 24
boot_retry_minutes = 30
storage_backend = "bucket"
"#
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path().to_str().unwrap())).unwrap();
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.scheduler.schedule_stale_hours, 48);
        assert_eq!(config.scheduler.build_stale_hours, 24);
        assert_eq!(config.scheduler.boot_retry_minutes, 30);
        assert_eq!(config.scheduler.storage_backend, StorageBackend::Bucket);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(
            file,
            r#"
[scheduler]
schedule_stale_hours = 0
build_stale_hours = 72
boot_retry_minutes = 60
storage_backend = "build-store"
"#
        )
        .unwrap();

        let result = AppConfig::load(Some(file.path().to_str().unwrap()));
        assert!(matches!(result, Err(SchedulerError::Configuration(_))));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let result = AppConfig::load(Some("/nonexistent/labsched.toml"));
        assert!(matches!(result, Err(SchedulerError::Configuration(_))));
    }
}
