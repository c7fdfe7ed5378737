//! # Flowcron Core
//!
//! Recurring jobs executed as one-shot orchestrator objects, with the
//! orchestrator's object store as the only durable state.
//!
//! - **Command builder** ([`command`]): validates a [`JobDefinition`] and
//!   renders the create invocation, embedding the job as labels.
//! - **Scheduler** ([`scheduler`]): owns the in-memory trigger map and creates
//!   a run object on every fire.
//! - **Job registry** ([`registry`]): rebuilds the job set from labelled objects,
//!   which is how triggers survive a restart.
//! - **Execution aggregator** ([`executions`]): a job's history, one record
//!   per task of each of its run objects.
//!
//! ```text
//! startup ──▶ JobRegistry ──▶ CronScheduler::reschedule_jobs
//!                                   │
//!             trigger fire ──▶ render ──▶ ObjectClient::create_run_object
//!
//! ExecutionAggregator ──▶ ObjectClient::list_objects / list_tasks
//! ```

pub mod client;
pub mod command;
pub mod error;
pub mod executions;
pub mod job;
pub mod labels;
pub mod memory_client;
pub mod registry;
pub mod schedule;
pub mod scheduler;
pub mod trigger;

pub use client::{ObjectClient, RunObject, RunTask};
pub use command::{render, render_recovered, RenderedCommand};
pub use error::{ClientError, CronError, RescheduleFailure, Result};
pub use executions::ExecutionAggregator;
pub use job::{ExecutionRecord, ExecutionStatus, JobDefinition, TaskState};
pub use labels::LabelFilter;
pub use memory_client::{MemoryObjectClient, Operation};
pub use registry::{JobRegistry, RecoveredJob};
pub use schedule::TriggerSchedule;
pub use scheduler::{CronScheduler, JobScheduler};
pub use trigger::TriggerHandle;
