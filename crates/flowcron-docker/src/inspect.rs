//! Decoding of `docker ... -q` and `docker inspect` output.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use flowcron_core::job::ExecutionStatus;
use flowcron_core::{ClientError, RunObject, RunTask};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ServiceInspect {
    #[serde(rename = "ID")]
    id: String,
    created_at: DateTime<Utc>,
    spec: ServiceSpec,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ServiceSpec {
    name: String,
    labels: Option<HashMap<String, String>>,
    task_template: TaskTemplate,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct TaskTemplate {
    container_spec: ContainerSpec,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ContainerSpec {
    image: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TaskInspect {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "ServiceID", default)]
    service_id: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    status: ExecutionStatus,
}

/// Split `-q` output into identifiers.
pub fn parse_ids(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

/// Decode `docker service inspect` output.
pub fn parse_services(json: &str) -> Result<Vec<RunObject>, ClientError> {
    let services: Vec<ServiceInspect> = serde_json::from_str(json)?;
    Ok(services
        .into_iter()
        .map(|s| RunObject {
            id: s.id,
            name: s.spec.name,
            labels: s.spec.labels.unwrap_or_default(),
            image: s.spec.task_template.container_spec.image,
            created_at: s.created_at,
        })
        .collect())
}

/// Decode `docker inspect --type task` output.
pub fn parse_tasks(json: &str) -> Result<Vec<RunTask>, ClientError> {
    let tasks: Vec<TaskInspect> = serde_json::from_str(json)?;
    Ok(tasks
        .into_iter()
        .map(|t| RunTask {
            id: t.id,
            object_id: t.service_id,
            created_at: t.created_at,
            status: t.status,
        })
        .collect())
}
