//! In-memory object client.
//!
//! Behaves like a single-node orchestrator that completes every run object
//! immediately. Used by the `--dry-run` mode of the service and by tests,
//! which can also inspect call counts and inject failures.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::client::{ObjectClient, RunObject, RunTask};
use crate::command::RenderedCommand;
use crate::error::ClientError;
use crate::job::{ExecutionStatus, TaskState};
use crate::labels::LabelFilter;

/// Object client operations, for call counting and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    List,
    Remove,
    ListTasks,
}

#[derive(Default)]
struct MemoryState {
    objects: Vec<RunObject>,
    tasks: HashMap<String, Vec<RunTask>>,
    last_created: Option<DateTime<Utc>>,
}

impl MemoryState {
    /// Creation times are strictly increasing so "most recent" is unambiguous.
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let ts = match self.last_created {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_created = Some(ts);
        ts
    }
}

/// Object client backed by process memory.
pub struct MemoryObjectClient {
    state: RwLock<MemoryState>,
    calls: DashMap<Operation, usize>,
    failures: DashMap<Operation, String>,
}

impl MemoryObjectClient {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MemoryState::default()),
            calls: DashMap::new(),
            failures: DashMap::new(),
        }
    }

    /// Insert an object with arbitrary labels, bypassing the command builder.
    ///
    /// One completed task is attached. Returns the object identifier.
    pub async fn seed(&self, labels: HashMap<String, String>, image: &str) -> String {
        let mut state = self.state.write().await;
        let name = labels
            .get(crate::labels::NAME)
            .cloned()
            .unwrap_or_else(|| "object".to_string());
        insert_object(&mut state, &name, labels, image)
    }

    /// Attach an extra task to an object.
    pub async fn add_task(&self, object_id: &str, state: TaskState) -> String {
        let mut store = self.state.write().await;
        let created_at = store.next_timestamp();
        let task = new_task(object_id, created_at, state);
        let id = task.id.clone();
        store.tasks.entry(object_id.to_string()).or_default().push(task);
        id
    }

    /// Snapshot of every stored object, in creation order.
    pub async fn objects(&self) -> Vec<RunObject> {
        self.state.read().await.objects.clone()
    }

    pub async fn object_count(&self) -> usize {
        self.state.read().await.objects.len()
    }

    /// How many times an operation has been called.
    pub fn calls(&self, op: Operation) -> usize {
        self.calls.get(&op).map(|c| *c.value()).unwrap_or(0)
    }

    /// Make every later call of `op` fail with `message`.
    pub fn fail(&self, op: Operation, message: impl Into<String>) {
        self.failures.insert(op, message.into());
    }

    /// Undo [`fail`](Self::fail).
    pub fn recover(&self, op: Operation) {
        self.failures.remove(&op);
    }

    fn enter(&self, op: Operation) -> Result<(), ClientError> {
        *self.calls.entry(op).or_insert(0) += 1;
        match self.failures.get(&op) {
            Some(message) => Err(ClientError::Unavailable(message.value().clone())),
            None => Ok(()),
        }
    }
}

impl Default for MemoryObjectClient {
    fn default() -> Self {
        Self::new()
    }
}

fn new_task(object_id: &str, created_at: DateTime<Utc>, state: TaskState) -> RunTask {
    RunTask {
        id: Uuid::new_v4().simple().to_string(),
        object_id: object_id.to_string(),
        created_at,
        status: ExecutionStatus {
            timestamp: Some(created_at),
            message: state.to_string(),
            ..ExecutionStatus::new(state)
        },
    }
}

fn insert_object(
    state: &mut MemoryState,
    job_name: &str,
    labels: HashMap<String, String>,
    image: &str,
) -> String {
    let id = Uuid::new_v4().simple().to_string();
    let created_at = state.next_timestamp();
    let object = RunObject {
        id: id.clone(),
        name: format!("{}-{}", job_name, &id[..8]),
        labels,
        image: image.to_string(),
        created_at,
    };
    state
        .tasks
        .insert(id.clone(), vec![new_task(&id, created_at, TaskState::Complete)]);
    state.objects.push(object);
    id
}

#[async_trait]
impl ObjectClient for MemoryObjectClient {
    async fn create_run_object(&self, command: &RenderedCommand) -> Result<String, ClientError> {
        self.enter(Operation::Create)?;
        let mut state = self.state.write().await;
        let id = insert_object(
            &mut state,
            &command.job_name,
            command.label_map(),
            &command.image,
        );
        debug!("Created in-memory run object {} for '{}'", id, command.job_name);
        Ok(id)
    }

    async fn list_objects(&self, filter: &LabelFilter) -> Result<Vec<RunObject>, ClientError> {
        self.enter(Operation::List)?;
        let state = self.state.read().await;
        Ok(state
            .objects
            .iter()
            .filter(|o| filter.matches(&o.labels))
            .cloned()
            .collect())
    }

    async fn remove_objects(&self, filter: &LabelFilter) -> Result<(), ClientError> {
        self.enter(Operation::Remove)?;
        let mut state = self.state.write().await;
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut state.objects)
            .into_iter()
            .partition(|o| filter.matches(&o.labels));
        state.objects = kept;
        for object in &removed {
            state.tasks.remove(&object.id);
        }
        debug!("Removed {} in-memory run objects", removed.len());
        Ok(())
    }

    async fn list_tasks(&self, object_id: &str) -> Result<Vec<RunTask>, ClientError> {
        self.enter(Operation::ListTasks)?;
        let state = self.state.read().await;
        Ok(state.tasks.get(object_id).cloned().unwrap_or_default())
    }
}
