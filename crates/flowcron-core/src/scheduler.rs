//! Job scheduler: owns the active triggers and creates run objects on fire.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use futures::FutureExt;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::client::ObjectClient;
use crate::command::{self, RenderedCommand};
use crate::error::{CronError, RescheduleFailure, Result};
use crate::job::JobDefinition;
use crate::labels::LabelFilter;
use crate::registry::{JobRegistry, RecoveredJob};
use crate::schedule::TriggerSchedule;
use crate::trigger::{FireFn, TriggerHandle};

/// Operations exposed to the API layer.
#[async_trait]
pub trait JobScheduler: Send + Sync {
    /// Validate a job, run it once and, when it has a schedule, keep firing
    /// it. Replaces the trigger of an already registered job with the same name.
    async fn add_job(&self, job: JobDefinition) -> Result<()>;

    /// Cancel a job's trigger and remove all of its run objects.
    async fn remove_job(&self, name: &str) -> Result<()>;

    /// Every job known to the orchestrator.
    async fn get_jobs(&self) -> Result<HashMap<String, JobDefinition>>;

    /// One job, if the orchestrator knows it.
    async fn get_job(&self, name: &str) -> Result<Option<JobDefinition>>;

    /// Register triggers for recurring jobs that have objects but no trigger.
    ///
    /// Returns how many triggers were registered.
    async fn reschedule_jobs(&self) -> Result<usize>;

    /// Cancel every trigger.
    async fn stop(&self);
}

/// Scheduler backed by in-process timers and an [`ObjectClient`].
///
/// Adds and removes of the same job name run one at a time. Jobs of different
/// names never wait for each other.
pub struct CronScheduler {
    client: Arc<dyn ObjectClient>,
    registry: JobRegistry,
    triggers: Mutex<HashMap<String, TriggerHandle>>,
    job_locks: DashMap<String, Arc<tokio::sync::Mutex<()>>>,
    /// Stamp of the last add or remove per job name.
    touched: DashMap<String, u64>,
    mutations: AtomicU64,
}

impl CronScheduler {
    /// Create a new scheduler. No trigger is active until jobs are added or
    /// rescheduled.
    pub fn new(client: Arc<dyn ObjectClient>) -> Self {
        Self {
            registry: JobRegistry::new(client.clone()),
            client,
            triggers: Mutex::new(HashMap::new()),
            job_locks: DashMap::new(),
            touched: DashMap::new(),
            mutations: AtomicU64::new(0),
        }
    }

    /// Names of jobs with an active trigger, sorted.
    pub fn active_triggers(&self) -> Vec<String> {
        let mut names: Vec<String> = self.triggers.lock().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn has_trigger(&self, name: &str) -> bool {
        self.triggers.lock().contains_key(name)
    }

    /// Validate and parse a job without side effects.
    fn prepare(job: &JobDefinition) -> Result<(RenderedCommand, Option<TriggerSchedule>)> {
        Self::with_schedule(job, command::render(job)?)
    }

    fn prepare_recovered(
        recovered: &RecoveredJob,
    ) -> Result<(RenderedCommand, Option<TriggerSchedule>)> {
        let job = &recovered.job;
        let rendered = command::render_recovered(job, recovered.legacy_invocation.as_deref())?;
        Self::with_schedule(job, rendered)
    }

    fn with_schedule(
        job: &JobDefinition,
        rendered: RenderedCommand,
    ) -> Result<(RenderedCommand, Option<TriggerSchedule>)> {
        let schedule = if job.is_recurring() {
            Some(TriggerSchedule::parse(&job.schedule)?)
        } else {
            None
        };
        Ok((rendered, schedule))
    }

    fn spawn_trigger(&self, rendered: RenderedCommand, schedule: TriggerSchedule) -> TriggerHandle {
        let name = rendered.job_name.clone();
        let fire = fire_callback(self.client.clone(), Arc::new(rendered));
        TriggerHandle::spawn(name, schedule, fire)
    }

    fn register(&self, rendered: RenderedCommand, schedule: TriggerSchedule) {
        let name = rendered.job_name.clone();
        let handle = self.spawn_trigger(rendered, schedule);

        if let Some(previous) = self.triggers.lock().insert(name.clone(), handle) {
            previous.cancel();
            debug!("Replaced trigger for job '{}'", name);
        }
    }

    /// Register unless the job already has a trigger. Returns whether it did.
    fn register_if_absent(&self, rendered: RenderedCommand, schedule: TriggerSchedule) -> bool {
        let mut triggers = self.triggers.lock();
        match triggers.entry(rendered.job_name.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(self.spawn_trigger(rendered, schedule));
                true
            }
        }
    }

    fn job_lock(&self, name: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.job_locks.entry(name.to_string()).or_default().value().clone()
    }

    fn touch(&self, name: &str) {
        let stamp = self.mutations.fetch_add(1, Ordering::SeqCst) + 1;
        self.touched.insert(name.to_string(), stamp);
    }

    /// Whether the job was added or removed after `since` was read.
    fn touched_since(&self, name: &str, since: u64) -> bool {
        self.touched.get(name).is_some_and(|stamp| *stamp.value() > since)
    }
}

fn fire_callback(client: Arc<dyn ObjectClient>, rendered: Arc<RenderedCommand>) -> FireFn {
    Arc::new(move || {
        let client = client.clone();
        let rendered = rendered.clone();
        async move {
            match client.create_run_object(&rendered).await {
                Ok(id) => info!("Job '{}' fired, created {}", rendered.job_name, id),
                Err(e) => error!("Job '{}' failed to fire: {}", rendered.job_name, e),
            }
        }
        .boxed()
    })
}

#[async_trait]
impl JobScheduler for CronScheduler {
    async fn add_job(&self, job: JobDefinition) -> Result<()> {
        let (rendered, schedule) = Self::prepare(&job)?;

        let lock = self.job_lock(&job.name);
        let _guard = lock.lock().await;

        let id = self
            .client
            .create_run_object(&rendered)
            .await
            .map_err(CronError::Creation)?;
        self.touch(&job.name);
        info!("Job '{}' created {}", job.name, id);

        if let Some(schedule) = schedule {
            self.register(rendered, schedule);
            info!("Job '{}' scheduled with '{}'", job.name, job.schedule);
        }
        Ok(())
    }

    async fn remove_job(&self, name: &str) -> Result<()> {
        let lock = self.job_lock(name);
        let _guard = lock.lock().await;

        self.touch(name);
        let previous = self.triggers.lock().remove(name);
        if let Some(handle) = previous {
            handle.cancel();
            debug!("Cancelled trigger for job '{}'", name);
        }

        self.client
            .remove_objects(&LabelFilter::job(name))
            .await
            .map_err(CronError::Removal)?;
        info!("Job '{}' removed", name);
        Ok(())
    }

    async fn get_jobs(&self) -> Result<HashMap<String, JobDefinition>> {
        self.registry.list_jobs().await
    }

    async fn get_job(&self, name: &str) -> Result<Option<JobDefinition>> {
        self.registry.get_job(name).await
    }

    async fn reschedule_jobs(&self) -> Result<usize> {
        let since = self.mutations.load(Ordering::SeqCst);
        let jobs = self.registry.list_recovered().await?;

        let mut names: Vec<&String> = jobs.keys().collect();
        names.sort();

        let mut registered = 0;
        let mut failures = Vec::new();
        for name in names {
            let recovered = &jobs[name];
            if !recovered.job.is_recurring() {
                continue;
            }
            let lock = self.job_lock(name);
            let _guard = lock.lock().await;
            // The listing predates this add or remove.
            if self.touched_since(name, since) || self.has_trigger(name) {
                continue;
            }
            match Self::prepare_recovered(recovered) {
                Ok((rendered, Some(schedule))) => {
                    if self.register_if_absent(rendered, schedule) {
                        registered += 1;
                    }
                }
                Ok((_, None)) => {}
                Err(error) => {
                    warn!("Could not reschedule job '{}': {}", name, error);
                    failures.push(RescheduleFailure {
                        job_name: name.clone(),
                        error,
                    });
                }
            }
        }

        info!("Rescheduled {} of {} known jobs", registered, jobs.len());
        if failures.is_empty() {
            Ok(registered)
        } else {
            Err(CronError::Reschedule(failures))
        }
    }

    async fn stop(&self) {
        let drained: Vec<(String, TriggerHandle)> = self.triggers.lock().drain().collect();
        for (name, handle) in &drained {
            handle.cancel();
            debug!("Stopped trigger for job '{}'", name);
        }
        if !drained.is_empty() {
            info!("Scheduler stopped {} triggers", drained.len());
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
