//! Docker CLI backed object client.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use flowcron_core::command::shell_quote;
use flowcron_core::{ClientError, LabelFilter, ObjectClient, RenderedCommand, RunObject, RunTask};

use crate::inspect::{parse_ids, parse_services, parse_tasks};

/// How to reach the Docker engine.
#[derive(Debug, Clone)]
pub struct DockerConfig {
    /// Path or name of the `docker` executable.
    pub binary: String,
    /// Engine endpoint, passed to every invocation as `DOCKER_HOST`.
    pub host: Option<String>,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            binary: "docker".to_string(),
            host: None,
        }
    }
}

/// Object client that manages Swarm services through the `docker` CLI.
#[derive(Debug, Clone)]
pub struct DockerServiceClient {
    config: DockerConfig,
}

impl DockerServiceClient {
    pub fn new(config: DockerConfig) -> Self {
        Self { config }
    }

    /// Check that the engine answers and return its version.
    pub async fn ping(&self) -> Result<String, ClientError> {
        let version = self
            .run(&["version", "--format", "{{.Server.Version}}"])
            .await?;
        Ok(version.trim().to_string())
    }

    /// Full shell line for a create invocation, detached so the call returns
    /// as soon as the service exists.
    fn create_line(&self, command: &RenderedCommand) -> String {
        let mut tokens = command.tokens();
        if let Some(program) = tokens.first_mut() {
            *program = shell_quote(&self.config.binary);
        }
        // After `<program> service create`.
        let at = tokens.len().min(3);
        tokens.insert(at, "--detach".to_string());
        tokens.join(" ")
    }

    fn command(&self, program: &str) -> Command {
        let mut cmd = Command::new(program);
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        if let Some(host) = &self.config.host {
            cmd.env("DOCKER_HOST", host);
        }
        cmd
    }

    async fn run(&self, args: &[&str]) -> Result<String, ClientError> {
        let display_line = format!("{} {}", self.config.binary, args.join(" "));
        debug!("Running `{}`", display_line);
        let output = self
            .command(&self.config.binary)
            .args(args)
            .output()
            .await
            .map_err(|e| spawn_error(&self.config.binary, e))?;
        collect(display_line, output)
    }

    async fn run_shell(&self, line: &str) -> Result<String, ClientError> {
        debug!("Running `sh -c {}`", line);
        let output = self
            .command("sh")
            .arg("-c")
            .arg(line)
            .output()
            .await
            .map_err(|e| spawn_error("sh", e))?;
        collect(line.to_string(), output)
    }

    async fn service_ids(&self, filter: &LabelFilter) -> Result<Vec<String>, ClientError> {
        let mut args = vec!["service".to_string(), "ls".to_string(), "-q".to_string()];
        for selector in filter.to_selectors() {
            args.push("--filter".to_string());
            args.push(format!("label={}", selector));
        }
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        Ok(parse_ids(&self.run(&args).await?))
    }
}

fn spawn_error(program: &str, e: std::io::Error) -> ClientError {
    if e.kind() == std::io::ErrorKind::NotFound {
        ClientError::Unavailable(format!("{} not found", program))
    } else {
        ClientError::Io(e)
    }
}

fn collect(command: String, output: std::process::Output) -> Result<String, ClientError> {
    if !output.status.success() {
        return Err(ClientError::CommandFailed {
            command,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

#[async_trait]
impl ObjectClient for DockerServiceClient {
    async fn create_run_object(&self, command: &RenderedCommand) -> Result<String, ClientError> {
        let stdout = self.run_shell(&self.create_line(command)).await?;
        parse_ids(&stdout)
            .pop()
            .ok_or_else(|| ClientError::Parse("service create returned no identifier".to_string()))
    }

    async fn list_objects(&self, filter: &LabelFilter) -> Result<Vec<RunObject>, ClientError> {
        let ids = self.service_ids(filter).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut args = vec!["service", "inspect"];
        args.extend(ids.iter().map(String::as_str));
        let objects = parse_services(&self.run(&args).await?)?;
        // The engine filters already; this guards against partial label support.
        Ok(objects
            .into_iter()
            .filter(|o| filter.matches(&o.labels))
            .collect())
    }

    async fn remove_objects(&self, filter: &LabelFilter) -> Result<(), ClientError> {
        let ids = self.service_ids(filter).await?;
        if ids.is_empty() {
            return Ok(());
        }

        let mut args = vec!["service", "rm"];
        args.extend(ids.iter().map(String::as_str));
        self.run(&args).await?;
        debug!("Removed {} services", ids.len());
        Ok(())
    }

    async fn list_tasks(&self, object_id: &str) -> Result<Vec<RunTask>, ClientError> {
        let stdout = self
            .run(&["service", "ps", "-q", "--no-trunc", object_id])
            .await?;
        let ids = parse_ids(&stdout);
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut args = vec!["inspect", "--type", "task"];
        args.extend(ids.iter().map(String::as_str));
        parse_tasks(&self.run(&args).await?)
    }
}
