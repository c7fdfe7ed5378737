//! Job registry: rebuilds job definitions from the orchestrator's objects.
//!
//! The orchestrator is the only durable record of which jobs exist. Every run
//! object carries the job's parameters in its labels, so a full scan of the
//! objects bearing the marker label yields the complete job set.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::client::{ObjectClient, RunObject};
use crate::error::{CronError, Result};
use crate::job::JobDefinition;
use crate::labels::{self, LabelFilter};

/// A job rebuilt from its most recent object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveredJob {
    pub job: JobDefinition,
    /// Create invocation to replay, for objects written without the
    /// run-command label.
    pub legacy_invocation: Option<String>,
}

/// Reconstructs the set of known jobs.
#[derive(Clone)]
pub struct JobRegistry {
    client: Arc<dyn ObjectClient>,
}

impl JobRegistry {
    pub fn new(client: Arc<dyn ObjectClient>) -> Self {
        Self { client }
    }

    /// List every known job, keyed by name.
    ///
    /// Objects whose labels cannot be decoded are skipped. When several
    /// objects belong to the same job, the most recently created one wins.
    pub async fn list_jobs(&self) -> Result<HashMap<String, JobDefinition>> {
        Ok(into_jobs(self.list_recovered().await?))
    }

    /// Like [`list_jobs`](Self::list_jobs), keeping what is needed to
    /// re-render each job.
    pub async fn list_recovered(&self) -> Result<HashMap<String, RecoveredJob>> {
        let filter = LabelFilter::marker().with_key(labels::NAME);
        debug!("Listing run objects with {:?}", filter.to_selectors());
        let objects = self
            .client
            .list_objects(&filter)
            .await
            .map_err(CronError::Query)?;

        Ok(recover(&objects))
    }

    /// Look up a single job by name.
    pub async fn get_job(&self, name: &str) -> Result<Option<JobDefinition>> {
        let objects = self
            .client
            .list_objects(&LabelFilter::job(name))
            .await
            .map_err(CronError::Query)?;

        Ok(reconstruct(&objects).remove(name))
    }
}

/// Fold a listing of run objects into one definition per job name.
pub fn reconstruct(objects: &[RunObject]) -> HashMap<String, JobDefinition> {
    into_jobs(recover(objects))
}

fn into_jobs(recovered: HashMap<String, RecoveredJob>) -> HashMap<String, JobDefinition> {
    recovered
        .into_iter()
        .map(|(name, recovered)| (name, recovered.job))
        .collect()
}

/// Fold a listing of run objects into one recovered job per name.
pub fn recover(objects: &[RunObject]) -> HashMap<String, RecoveredJob> {
    let mut latest: HashMap<String, &RunObject> = HashMap::new();
    let mut jobs: HashMap<String, RecoveredJob> = HashMap::new();

    for object in objects {
        let decoded = match labels::decode(&object.labels) {
            Ok(decoded) => decoded,
            Err(problem) => {
                warn!("Skipping object {} ({}): {}", object.name, object.id, problem);
                continue;
            }
        };

        // Ties keep the later entry in listing order.
        if let Some(seen) = latest.get(&decoded.name) {
            if seen.created_at > object.created_at {
                continue;
            }
        }

        latest.insert(decoded.name.clone(), object);
        jobs.insert(
            decoded.name.clone(),
            RecoveredJob {
                job: JobDefinition {
                    name: decoded.name,
                    image: object.image.clone(),
                    command: decoded.command,
                    schedule: decoded.schedule,
                    args: decoded.args,
                    service_name: service_name(object),
                },
                legacy_invocation: decoded.legacy_invocation,
            },
        );
    }

    jobs
}

fn service_name(object: &RunObject) -> String {
    if object.name.is_empty() {
        object.id.clone()
    } else {
        object.name.clone()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
