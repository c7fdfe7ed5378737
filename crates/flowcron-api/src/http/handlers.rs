//! Job request handlers.

use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use flowcron_core::{ExecutionRecord, JobDefinition};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::state::ApiState;

const OK: &str = "OK";
const NOK: &str = "NOK";

/// Response envelope shared by every endpoint.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApiResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job: Option<JobDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jobs: Option<HashMap<String, JobDefinition>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executions: Option<Vec<ExecutionRecord>>,
}

impl ApiResponse {
    pub fn ok() -> Self {
        Self {
            status: OK.to_string(),
            ..Default::default()
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: NOK.to_string(),
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

type ApiResult = Result<Json<ApiResponse>, ApiError>;

/// Decode a job from a request body, letting the path name win.
fn decode_job(name: Option<String>, body: &[u8]) -> Result<JobDefinition, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::BadRequest("Request body is required".to_string()));
    }
    let mut job: JobDefinition = serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid job definition: {}", e)))?;
    if let Some(name) = name {
        job.name = name;
    }
    Ok(job)
}

async fn schedule(state: ApiState, name: Option<String>, body: Bytes) -> ApiResult {
    let mut job = decode_job(name, &body)?;
    info!("Scheduling job '{}' (schedule: '{}')", job.name, job.schedule);

    state.scheduler.add_job(job.clone()).await?;

    // The job is scheduled either way; the lookup only names its object.
    match state.scheduler.get_job(&job.name).await {
        Ok(Some(stored)) => job.service_name = stored.service_name,
        Ok(None) => {}
        Err(e) => warn!("Could not look up scheduled job '{}': {}", job.name, e),
    }

    Ok(Json(ApiResponse {
        message: format!("Job {} has been scheduled", job.name),
        job: Some(job),
        ..ApiResponse::ok()
    }))
}

/// PUT /v1/docker-flow-cron/job
pub async fn put_job(State(state): State<ApiState>, body: Bytes) -> ApiResult {
    schedule(state, None, body).await
}

/// PUT /v1/docker-flow-cron/job/{jobName}
pub async fn put_named_job(
    State(state): State<ApiState>,
    Path(name): Path<String>,
    body: Bytes,
) -> ApiResult {
    schedule(state, Some(name), body).await
}

/// GET /v1/docker-flow-cron/job
pub async fn list_jobs(State(state): State<ApiState>) -> ApiResult {
    let jobs = state.scheduler.get_jobs().await?;
    Ok(Json(ApiResponse {
        jobs: Some(jobs),
        ..ApiResponse::ok()
    }))
}

/// GET /v1/docker-flow-cron/job/{jobName}
pub async fn get_job(State(state): State<ApiState>, Path(name): Path<String>) -> ApiResult {
    let executions = state.executions.list_executions(&name).await?;
    let job = state
        .scheduler
        .get_job(&name)
        .await?
        .unwrap_or_else(|| JobDefinition {
            name: name.clone(),
            ..Default::default()
        });

    Ok(Json(ApiResponse {
        job: Some(job),
        executions: Some(executions),
        ..ApiResponse::ok()
    }))
}

/// DELETE /v1/docker-flow-cron/job/{jobName}
pub async fn delete_job(State(state): State<ApiState>, Path(name): Path<String>) -> ApiResult {
    info!("Deleting job '{}'", name);
    state.scheduler.remove_job(&name).await?;
    Ok(Json(
        ApiResponse::ok().with_message(format!("{} was deleted", name)),
    ))
}

/// GET /health
pub async fn health() -> Json<ApiResponse> {
    Json(ApiResponse::ok())
}

#[cfg(test)]
#[path = "handlers_tests.rs"]
mod tests;
