//! # Flowcron API
//!
//! HTTP interface to the scheduler, wire compatible with existing
//! `/v1/docker-flow-cron` clients.
//!
//! ```text
//! PUT    /v1/docker-flow-cron/job            - Schedule a job (name in body)
//! PUT    /v1/docker-flow-cron/job/{jobName}  - Schedule a job
//! GET    /v1/docker-flow-cron/job            - List jobs
//! GET    /v1/docker-flow-cron/job/{jobName}  - Job details and executions
//! DELETE /v1/docker-flow-cron/job/{jobName}  - Remove a job and its services
//! GET    /health                             - Liveness
//! ```

pub mod error;
pub mod http;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use http::routes::create_router;
pub use server::{ApiServer, ServerSettings};
pub use state::ApiState;
