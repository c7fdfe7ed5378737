//! Command builder: validates a job and renders the create invocation.
//!
//! The rendered invocation embeds the job's metadata as labels so the job can
//! be rebuilt later from the orchestrator alone.

use std::collections::HashMap;

use crate::error::{CronError, Result};
use crate::job::JobDefinition;
use crate::labels;

/// Program the rendered invocation starts with.
pub const PROGRAM: &str = "docker";

/// Prefix of every create invocation, as stored in the command label.
pub const CREATE_PREFIX: &str = "docker service create";

const CREATE: [&str; 2] = ["service", "create"];
const RESTART_FLAG: &str = "--restart-condition";
const NAME_FLAG: &str = "--name";
const ONE_SHOT: &str = "none";

/// A validated create invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCommand {
    /// Job the invocation belongs to.
    pub job_name: String,
    /// Labels in the order they are written.
    pub labels: Vec<(String, String)>,
    pub image: String,
    /// Create arguments after the program and `service create`, labels
    /// excluded. Each entry is a shell fragment.
    pub body: Vec<String>,
}

impl RenderedCommand {
    /// Labels as a map.
    pub fn label_map(&self) -> HashMap<String, String> {
        self.labels.iter().cloned().collect()
    }

    /// The literal invocation stored in the command label.
    pub fn command_line(&self) -> String {
        command_line(&self.body)
    }

    /// Shell tokens of the full invocation, program included.
    pub fn tokens(&self) -> Vec<String> {
        let mut tokens: Vec<String> = std::iter::once(PROGRAM)
            .chain(CREATE)
            .map(String::from)
            .collect();
        for (key, value) in &self.labels {
            tokens.push("-l".to_string());
            tokens.push(shell_quote(&format!("{}={}", key, value)));
        }
        tokens.extend(self.body.iter().cloned());
        tokens
    }

    /// The full invocation as one shell command line.
    pub fn to_shell(&self) -> String {
        self.tokens().join(" ")
    }
}

/// Validate a job and render its create invocation.
///
/// The image and the command always follow the create flags, whatever the
/// command contains.
pub fn render(job: &JobDefinition) -> Result<RenderedCommand> {
    validate(job)?;

    let image = job.image.trim().to_string();
    let args: Vec<String> = job
        .args
        .iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .map(String::from)
        .collect();

    let mut body = args.clone();
    if !args.iter().any(|a| mentions_flag(a, RESTART_FLAG)) {
        body.push(format!("{} {}", RESTART_FLAG, ONE_SHOT));
    }
    body.push(image.clone());
    let command = job.command.trim();
    if !command.is_empty() {
        body.push(command.to_string());
    }

    let mut labels = base_labels(job, &body);
    labels.push((labels::ARGS.to_string(), labels::encode_args(&args)));
    labels.push((labels::RUN_COMMAND.to_string(), job.command.clone()));

    Ok(RenderedCommand {
        job_name: job.name.clone(),
        labels,
        image,
        body,
    })
}

/// Render a job recovered from an object that predates the args and
/// run-command labels.
///
/// Such objects only record the full create invocation. When `invocation` is
/// one, it is replayed as is rather than nested inside a new one, and the
/// replayed object keeps the same label shape so later recoveries replay it
/// again. Anything else renders like a new job.
pub fn render_recovered(job: &JobDefinition, invocation: Option<&str>) -> Result<RenderedCommand> {
    let Some(tail) = invocation.and_then(create_tail) else {
        return render(job);
    };
    validate(job)?;
    validate_tokens(tail)?;

    let body = vec![tail.to_string()];
    Ok(RenderedCommand {
        job_name: job.name.clone(),
        labels: base_labels(job, &body),
        image: job.image.trim().to_string(),
        body,
    })
}

fn base_labels(job: &JobDefinition, body: &[String]) -> Vec<(String, String)> {
    vec![
        (labels::MARKER.to_string(), labels::MARKER_VALUE.to_string()),
        (labels::NAME.to_string(), job.name.clone()),
        (labels::SCHEDULE.to_string(), job.schedule.clone()),
        (labels::COMMAND.to_string(), command_line(body)),
    ]
}

/// Check the fields and flags of a job without rendering it.
pub fn validate(job: &JobDefinition) -> Result<()> {
    if job.name.trim().is_empty() {
        return Err(CronError::Validation("Job name is mandatory".to_string()));
    }
    if job.image.trim().is_empty() {
        return Err(CronError::Validation("Image is mandatory".to_string()));
    }

    // A fragment may hold several flags.
    for arg in &job.args {
        validate_tokens(arg)?;
    }

    Ok(())
}

fn check_flag(arg: &str) -> Result<()> {
    if flag_value(arg, NAME_FLAG).is_some() {
        return Err(CronError::Validation(
            "--name argument cannot be set".to_string(),
        ));
    }
    if let Some(value) = flag_value(arg, RESTART_FLAG) {
        let value = unquote(value);
        if value != ONE_SHOT {
            return Err(CronError::Validation(format!(
                "--restart-condition cannot be set to '{}', only '{}' is allowed",
                value, ONE_SHOT
            )));
        }
    }
    Ok(())
}

/// Scan shell text for `--name` and a `--restart-condition` other than `none`.
fn validate_tokens(tail: &str) -> Result<()> {
    let tokens: Vec<&str> = tail.split_whitespace().collect();
    for (i, token) in tokens.iter().enumerate() {
        if *token == RESTART_FLAG {
            let value = tokens.get(i + 1).copied().unwrap_or("");
            check_flag(&format!("{} {}", token, value))?;
        } else if token.starts_with(NAME_FLAG) || token.starts_with(RESTART_FLAG) {
            check_flag(token)?;
        }
    }
    Ok(())
}

fn create_tail(invocation: &str) -> Option<&str> {
    let tail = invocation.trim().strip_prefix(CREATE_PREFIX)?;
    if !tail.starts_with(char::is_whitespace) {
        return None;
    }
    let tail = tail.trim();
    (!tail.is_empty()).then_some(tail)
}

fn mentions_flag(fragment: &str, flag: &str) -> bool {
    fragment
        .split_whitespace()
        .any(|token| flag_value(token, flag).is_some())
}

/// Return the value part when `arg` is `flag`, `flag value` or `flag=value`.
fn flag_value<'a>(arg: &'a str, flag: &str) -> Option<&'a str> {
    let rest = arg.strip_prefix(flag)?;
    if rest.is_empty() {
        return Some("");
    }
    if let Some(value) = rest.strip_prefix('=') {
        return Some(value.trim());
    }
    if rest.starts_with(char::is_whitespace) {
        return Some(rest.trim());
    }
    None
}

fn unquote(value: &str) -> &str {
    let value = value.trim();
    for q in ['\'', '"'] {
        if let Some(inner) = value.strip_prefix(q).and_then(|v| v.strip_suffix(q)) {
            return inner;
        }
    }
    value
}

fn command_line(body: &[String]) -> String {
    std::iter::once(CREATE_PREFIX)
        .chain(body.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Quote a value for POSIX `sh` using single quotes.
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

#[cfg(test)]
impl RenderedCommand {
    pub(crate) fn label(&self, key: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
