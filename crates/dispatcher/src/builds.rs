use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use labsched_core::config::StorageBackend;
use labsched_core::SchedulerResult;
use labsched_domain::entities::BuildQuery;
use labsched_domain::repositories::BuildRepository;

/// Outcome of resolving one build role for a draft job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildResolution {
    /// A concrete build id (empty when the role is not required).
    Resolved(String),
    /// Bucket-backed storage; the execution layer fetches the artifact
    /// later, so nothing to look up now.
    Deferred,
    /// A build is required but none qualifies.
    Unresolved,
}

impl BuildResolution {
    pub fn is_satisfied(&self) -> bool {
        !matches!(self, BuildResolution::Unresolved)
    }

    /// Build id to persist on the job. Deferred roles normalize to empty.
    pub fn into_build_id(self) -> String {
        match self {
            BuildResolution::Resolved(id) => id,
            BuildResolution::Deferred | BuildResolution::Unresolved => String::new(),
        }
    }
}

/// Resolves build ids for the three build roles of a job (device, system
/// image, test suite).
pub struct BuildResolver {
    build_repo: Arc<dyn BuildRepository>,
    storage_backend: StorageBackend,
    build_stale_hours: i64,
}

impl BuildResolver {
    pub fn new(
        build_repo: Arc<dyn BuildRepository>,
        storage_backend: StorageBackend,
        build_stale_hours: i64,
    ) -> Self {
        Self {
            build_repo,
            storage_backend,
            build_stale_hours,
        }
    }

    pub async fn resolve(
        &self,
        artifact_type: &str,
        manifest_branch: &str,
        build_target: &str,
        signed_only: bool,
        now: DateTime<Utc>,
    ) -> SchedulerResult<BuildResolution> {
        if manifest_branch.is_empty() {
            return Ok(BuildResolution::Resolved(String::new()));
        }

        match self.storage_backend {
            StorageBackend::Bucket => Ok(BuildResolution::Deferred),
            StorageBackend::BuildStore => {
                let query = BuildQuery {
                    artifact_type: artifact_type.to_string(),
                    manifest_branch: manifest_branch.to_string(),
                    build_target: build_target.to_string(),
                    signed_only,
                    newer_than: now - Duration::hours(self.build_stale_hours),
                };
                match self.build_repo.latest(&query).await? {
                    Some(build) => Ok(BuildResolution::Resolved(build.build_id)),
                    None => {
                        debug!(
                            artifact_type,
                            manifest_branch, build_target, "no fresh build found"
                        );
                        Ok(BuildResolution::Unresolved)
                    }
                }
            }
        }
    }
}
