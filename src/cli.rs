//! CLI definitions for Flowcron.

use std::path::PathBuf;

use clap::Parser;
use flowcron_config::Config;

/// Flowcron CLI.
#[derive(Debug, Parser)]
#[command(name = "flowcron")]
#[command(about = "Cron-style job scheduler for Docker Swarm services")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/flowcron.toml")]
    pub config: PathBuf,

    /// Server host
    #[arg(long, env = "FLOWCRON_HOST")]
    pub host: Option<String>,

    /// Server port
    #[arg(long, env = "FLOWCRON_PORT")]
    pub port: Option<u16>,

    /// Docker engine endpoint
    #[arg(long, env = "DOCKER_HOST")]
    pub docker_host: Option<String>,

    /// Keep run objects in memory instead of creating Swarm services
    #[arg(long)]
    pub dry_run: bool,

    /// Do not recover triggers from existing services on start
    #[arg(long)]
    pub no_reschedule: bool,
}

impl Cli {
    /// Apply command line overrides on top of the file configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(docker_host) = &self.docker_host {
            config.docker.host = Some(docker_host.clone());
        }
        if self.no_reschedule {
            config.scheduler.reschedule_on_start = false;
        }
    }
}
