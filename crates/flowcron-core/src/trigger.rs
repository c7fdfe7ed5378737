//! Time-trigger engine: one tokio task per registered job.

use std::sync::Arc;

use chrono::Utc;
use futures::future::BoxFuture;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::schedule::TriggerSchedule;

/// Callback invoked on every fire. Each invocation runs on its own task.
pub type FireFn = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Handle to a running trigger. Dropping the handle cancels the trigger.
#[derive(Debug)]
pub struct TriggerHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl TriggerHandle {
    /// Start a trigger that calls `fire` at every time produced by `schedule`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(name: impl Into<String>, schedule: TriggerSchedule, fire: FireFn) -> Self {
        let name = name.into();
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            let mut last = Utc::now();
            loop {
                let Some(next) = schedule.next_after(last) else {
                    debug!("Trigger '{}' has no future fire time", name);
                    break;
                };
                let wait = (next - Utc::now()).to_std().unwrap_or_default();

                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(wait) => {}
                }
                if token.is_cancelled() {
                    break;
                }

                trace!("Trigger '{}' fired for {}", name, next);
                tokio::spawn(fire());
                // Missed fire times are skipped, not replayed.
                last = next.max(Utc::now());
            }
            debug!("Trigger '{}' stopped", name);
        });

        Self { cancel, task }
    }

    /// Prevent future fires. In-flight fires are not interrupted.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Whether the timer task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for TriggerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
