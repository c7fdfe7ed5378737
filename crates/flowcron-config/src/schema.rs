//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub docker: DockerSection,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP listener.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Docker engine access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DockerSection {
    /// `docker` executable.
    #[serde(default = "default_binary")]
    pub binary: String,

    /// Engine endpoint, e.g. `unix:///var/run/docker.sock`.
    #[serde(default)]
    pub host: Option<String>,
}

impl Default for DockerSection {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            host: None,
        }
    }
}

fn default_binary() -> String {
    "docker".to_string()
}

/// Scheduler behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Recover triggers from existing services before serving.
    #[serde(default = "default_true")]
    pub reschedule_on_start: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            reschedule_on_start: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Log output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_level")]
    pub level: String,

    /// Directory for daily rolling log files. Console only when unset.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            dir: None,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
