//! Service wiring: object client, scheduler recovery and the API server.

use std::sync::Arc;

use anyhow::Context;
use flowcron_api::{ApiServer, ApiState, ServerSettings};
use flowcron_config::Config;
use flowcron_core::{CronError, CronScheduler, JobScheduler, MemoryObjectClient, ObjectClient};
use flowcron_docker::{DockerConfig, DockerServiceClient};
use tracing::{info, warn};

use crate::shutdown::install_shutdown_handler;

/// Build the object client the scheduler drives.
async fn build_client(config: &Config, dry_run: bool) -> anyhow::Result<Arc<dyn ObjectClient>> {
    if dry_run {
        warn!("Dry run: run objects are kept in memory and nothing is executed");
        return Ok(Arc::new(MemoryObjectClient::new()));
    }

    let client = DockerServiceClient::new(DockerConfig {
        binary: config.docker.binary.clone(),
        host: config.docker.host.clone(),
    });
    let version = client
        .ping()
        .await
        .context("Docker engine is not reachable")?;
    info!("Connected to Docker engine {}", version);
    Ok(Arc::new(client))
}

/// Register triggers for jobs that survived a restart.
///
/// Jobs that cannot be re-registered are logged and skipped. Failing to list
/// the orchestrator's objects aborts startup.
pub(crate) async fn recover_triggers(scheduler: &dyn JobScheduler) -> anyhow::Result<()> {
    match scheduler.reschedule_jobs().await {
        Ok(_) => Ok(()),
        Err(CronError::Reschedule(failures)) => {
            warn!(
                "Continuing without {} job(s) that could not be rescheduled",
                failures.len()
            );
            Ok(())
        }
        Err(e) => Err(e).context("Failed to reschedule existing jobs"),
    }
}

/// Run the service until SIGTERM or SIGINT.
pub(crate) async fn run_service(config: Config, dry_run: bool) -> anyhow::Result<()> {
    let client = build_client(&config, dry_run).await?;
    let scheduler = Arc::new(CronScheduler::new(client.clone()));

    if config.scheduler.reschedule_on_start {
        recover_triggers(scheduler.as_ref()).await?;
    }

    let state = ApiState::new(scheduler.clone(), client);
    let server = ApiServer::new(
        ServerSettings::new(config.server.host.clone(), config.server.port),
        state,
    );

    info!("Flowcron ready:");
    info!("  API Server:    http://{}", server.addr());

    let shutdown = install_shutdown_handler();
    let result = server
        .run(async move { shutdown.cancelled().await })
        .await
        .with_context(|| format!("API server on {} failed", server.addr()));

    scheduler.stop().await;
    info!("Shutting down...");
    result
}
