//! Object client capability consumed by the scheduler.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::command::RenderedCommand;
use crate::error::ClientError;
use crate::job::ExecutionStatus;
use crate::labels::LabelFilter;

/// An orchestrator object created for one firing of a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunObject {
    /// Orchestrator-assigned identifier.
    pub id: String,
    /// Object name as known to the orchestrator.
    pub name: String,
    pub labels: HashMap<String, String>,
    /// Image from the object's run specification.
    pub image: String,
    pub created_at: DateTime<Utc>,
}

/// A task scheduled by the orchestrator for a run object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunTask {
    pub id: String,
    pub object_id: String,
    pub created_at: DateTime<Utc>,
    pub status: ExecutionStatus,
}

/// Create/list/remove operations against orchestrator objects.
///
/// Every call is a single blocking round trip to the orchestrator; retries
/// and timeouts are the implementation's business.
#[async_trait]
pub trait ObjectClient: Send + Sync {
    /// Create a run object from a rendered invocation and return its identifier.
    async fn create_run_object(&self, command: &RenderedCommand) -> Result<String, ClientError>;

    /// List objects whose labels satisfy the filter.
    async fn list_objects(&self, filter: &LabelFilter) -> Result<Vec<RunObject>, ClientError>;

    /// Remove every object whose labels satisfy the filter.
    async fn remove_objects(&self, filter: &LabelFilter) -> Result<(), ClientError>;

    /// List the tasks of one object.
    async fn list_tasks(&self, object_id: &str) -> Result<Vec<RunTask>, ClientError>;
}
