//! Execution aggregator: a job's run history, rebuilt from its run objects.

use std::sync::Arc;

use tracing::debug;

use crate::client::ObjectClient;
use crate::error::{CronError, Result};
use crate::job::ExecutionRecord;
use crate::labels::LabelFilter;

/// Lists the executions of a single job.
#[derive(Clone)]
pub struct ExecutionAggregator {
    client: Arc<dyn ObjectClient>,
}

impl ExecutionAggregator {
    pub fn new(client: Arc<dyn ObjectClient>) -> Self {
        Self { client }
    }

    /// One record per task of every run object of `job_name`.
    ///
    /// Records follow the order the client lists objects and tasks in. Fails
    /// with [`CronError::NotFound`] when the job has no objects at all; any
    /// listing failure discards the partial result.
    pub async fn list_executions(&self, job_name: &str) -> Result<Vec<ExecutionRecord>> {
        let objects = self
            .client
            .list_objects(&LabelFilter::job(job_name))
            .await
            .map_err(CronError::Query)?;

        if objects.is_empty() {
            return Err(CronError::NotFound(job_name.to_string()));
        }

        let mut records = Vec::new();
        for object in &objects {
            let tasks = self
                .client
                .list_tasks(&object.id)
                .await
                .map_err(CronError::Query)?;

            records.extend(tasks.into_iter().map(|task| ExecutionRecord {
                created_at: task.created_at,
                status: task.status,
                run_identifier: object.id.clone(),
                task_id: task.id,
            }));
        }

        let finished = records.iter().filter(|r| r.status.state.is_terminal()).count();
        debug!(
            "Job '{}' has {} execution(s), {} finished",
            job_name,
            records.len(),
            finished
        );
        Ok(records)
    }
}

#[cfg(test)]
#[path = "executions_tests.rs"]
mod tests;
