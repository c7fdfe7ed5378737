//! HTTP route definitions.

use axum::{
    routing::{get, put},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::ApiState;

/// Prefix shared by every job route.
pub const API_PREFIX: &str = "/v1/docker-flow-cron";

/// Create the router.
///
/// ```text
/// /v1/docker-flow-cron
///   PUT    /job            - Schedule job (name from body)
///   GET    /job            - List jobs
///   PUT    /job/{jobName}  - Schedule job
///   GET    /job/{jobName}  - Job details with executions
///   DELETE /job/{jobName}  - Remove job
///
/// /health - Liveness check
/// ```
pub fn create_router(state: ApiState) -> Router {
    let job_routes = Router::new()
        .route("/job", put(handlers::put_job).get(handlers::list_jobs))
        .route(
            "/job/{jobName}",
            put(handlers::put_named_job)
                .get(handlers::get_job)
                .delete(handlers::delete_job),
        )
        .with_state(state);

    Router::new()
        .nest(API_PREFIX, job_routes)
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;
