//! Job definition and execution records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user-facing recurring (or one-shot) job.
///
/// Serialized with PascalCase keys so existing clients of the HTTP API keep
/// working unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct JobDefinition {
    /// Unique job name.
    pub name: String,
    /// Image the run object executes.
    pub image: String,
    /// Arguments passed to the created run.
    pub command: String,
    /// Cron expression or shorthand. Empty means run once.
    pub schedule: String,
    /// Extra flags for the create invocation, one flag (with its value) per entry.
    pub args: Vec<String>,
    /// Identifier of the most recent run object for this job.
    pub service_name: String,
}

impl JobDefinition {
    /// Create a new job definition.
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            ..Default::default()
        }
    }

    /// Set the command.
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    /// Set the schedule.
    pub fn with_schedule(mut self, schedule: impl Into<String>) -> Self {
        self.schedule = schedule.into();
        self
    }

    /// Append a create flag.
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Whether the job registers a recurring trigger.
    pub fn is_recurring(&self) -> bool {
        !self.schedule.trim().is_empty()
    }
}

/// Lifecycle state of a task backing a run object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    New,
    Allocated,
    Pending,
    Assigned,
    Accepted,
    Preparing,
    Ready,
    Starting,
    Running,
    Complete,
    Shutdown,
    Failed,
    Rejected,
    Remove,
    Orphaned,
    #[serde(other)]
    Unknown,
}

impl TaskState {
    /// Whether the task will not change state any more.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Complete
                | TaskState::Shutdown
                | TaskState::Failed
                | TaskState::Rejected
                | TaskState::Orphaned
        )
    }
}

impl Default for TaskState {
    fn default() -> Self {
        TaskState::Unknown
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskState::New => "new",
            TaskState::Allocated => "allocated",
            TaskState::Pending => "pending",
            TaskState::Assigned => "assigned",
            TaskState::Accepted => "accepted",
            TaskState::Preparing => "preparing",
            TaskState::Ready => "ready",
            TaskState::Starting => "starting",
            TaskState::Running => "running",
            TaskState::Complete => "complete",
            TaskState::Shutdown => "shutdown",
            TaskState::Failed => "failed",
            TaskState::Rejected => "rejected",
            TaskState::Remove => "remove",
            TaskState::Orphaned => "orphaned",
            TaskState::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Status reported by the orchestrator for one task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ExecutionStatus {
    /// When the status was last updated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    pub state: TaskState,
    pub message: String,
    #[serde(rename = "Err", skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionStatus {
    pub fn new(state: TaskState) -> Self {
        Self {
            state,
            ..Default::default()
        }
    }
}

/// One historical execution of a job, rebuilt on demand from run objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    #[serde(rename = "CreatedAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "Status")]
    pub status: ExecutionStatus,
    /// Identifier of the run object the task belongs to.
    #[serde(rename = "ServiceId")]
    pub run_identifier: String,
    #[serde(rename = "TaskId")]
    pub task_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_definition_builder() {
        let job = JobDefinition::new("backup", "alpine")
            .with_command("echo hi")
            .with_schedule("@daily")
            .with_arg("--constraint 'node.role==worker'");

        assert_eq!(job.name, "backup");
        assert_eq!(job.image, "alpine");
        assert_eq!(job.command, "echo hi");
        assert_eq!(job.args.len(), 1);
        assert!(job.is_recurring());
        assert!(job.service_name.is_empty());
    }

    #[test]
    fn test_blank_schedule_is_not_recurring() {
        let job = JobDefinition::new("once", "alpine").with_schedule("  ");
        assert!(!job.is_recurring());
    }

    #[test]
    fn test_job_definition_pascal_case_json() {
        let json = serde_json::json!({
            "Name": "my-job",
            "Image": "alpine",
            "Schedule": "@yearly"
        });
        let job: JobDefinition = serde_json::from_value(json).unwrap();
        assert_eq!(job.name, "my-job");
        assert_eq!(job.schedule, "@yearly");
        assert!(job.args.is_empty());

        let back = serde_json::to_value(&job).unwrap();
        assert_eq!(back["ServiceName"], "");
        assert_eq!(back["Image"], "alpine");
    }

    #[test]
    fn test_task_state_unknown_fallback() {
        let state: TaskState = serde_json::from_str("\"something-new\"").unwrap();
        assert_eq!(state, TaskState::Unknown);

        let state: TaskState = serde_json::from_str("\"complete\"").unwrap();
        assert_eq!(state, TaskState::Complete);
        assert!(state.is_terminal());
        assert_eq!(state.to_string(), "complete");
    }

    #[test]
    fn test_execution_status_swarm_json() {
        let json = serde_json::json!({
            "Timestamp": "2026-01-02T03:04:05Z",
            "State": "failed",
            "Message": "started",
            "Err": "task: non-zero exit (1)"
        });
        let status: ExecutionStatus = serde_json::from_value(json).unwrap();
        assert_eq!(status.state, TaskState::Failed);
        assert_eq!(status.error.as_deref(), Some("task: non-zero exit (1)"));
        assert!(status.timestamp.is_some());
    }
}
