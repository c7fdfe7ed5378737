//! Shared handler state.

use std::sync::Arc;

use flowcron_core::{ExecutionAggregator, JobScheduler, ObjectClient};

/// State handed to every route.
#[derive(Clone)]
pub struct ApiState {
    pub scheduler: Arc<dyn JobScheduler>,
    pub executions: ExecutionAggregator,
}

impl ApiState {
    pub fn new(scheduler: Arc<dyn JobScheduler>, client: Arc<dyn ObjectClient>) -> Self {
        Self {
            scheduler,
            executions: ExecutionAggregator::new(client),
        }
    }
}
