//! # Flowcron Docker
//!
//! [`ObjectClient`](flowcron_core::ObjectClient) implementation that drives a
//! Docker Swarm manager through the `docker` CLI. Run objects are Swarm
//! services created with `--restart-condition none`; their tasks are the
//! executions.

mod client;
mod inspect;

pub use client::{DockerConfig, DockerServiceClient};
pub use inspect::{parse_ids, parse_services, parse_tasks};
