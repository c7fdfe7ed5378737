//! Scheduler and object client error types.

use thiserror::Error;

/// Errors returned by an [`ObjectClient`](crate::client::ObjectClient).
#[derive(Debug, Error)]
pub enum ClientError {
    /// The orchestrator CLI exited with a failure status.
    #[error("Command `{command}` failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    /// Orchestrator output could not be decoded.
    #[error("Failed to parse orchestrator output: {0}")]
    Parse(String),

    /// Orchestrator is not reachable.
    #[error("Orchestrator unavailable: {0}")]
    Unavailable(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Parse(e.to_string())
    }
}

/// A job that could not be re-registered while rescheduling.
#[derive(Debug)]
pub struct RescheduleFailure {
    pub job_name: String,
    pub error: CronError,
}

impl std::fmt::Display for RescheduleFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.job_name, self.error)
    }
}

/// Scheduler error types.
#[derive(Debug, Error)]
pub enum CronError {
    /// The job definition is not acceptable.
    #[error("{0}")]
    Validation(String),

    /// The schedule expression could not be parsed.
    #[error("Invalid schedule '{schedule}': {reason}")]
    Schedule { schedule: String, reason: String },

    /// Listing objects or tasks failed.
    #[error("{0}")]
    Query(#[source] ClientError),

    /// Removing objects failed.
    #[error("{0}")]
    Removal(#[source] ClientError),

    /// Creating a run object failed.
    #[error("{0}")]
    Creation(#[source] ClientError),

    /// No object matches the requested job.
    #[error("Could not find the job {0}")]
    NotFound(String),

    /// Some jobs could not be re-registered.
    #[error("Failed to reschedule {} job(s): {}", .0.len(), join_failures(.0))]
    Reschedule(Vec<RescheduleFailure>),
}

impl CronError {
    /// Whether the error is caused by the caller's input rather than the
    /// orchestrator.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CronError::Validation(_) | CronError::Schedule { .. } | CronError::NotFound(_)
        )
    }

    /// Whether the error means the job does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CronError::NotFound(_))
    }
}

fn join_failures(failures: &[RescheduleFailure]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, CronError>;
