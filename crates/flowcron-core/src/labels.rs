//! Label schema written on every run object.
//!
//! The first four keys are shared with existing deployments and must not
//! change. [`ARGS`] and [`RUN_COMMAND`] are written alongside them so a job can
//! be rebuilt field for field; objects created without them are still decoded.

use std::collections::HashMap;

/// Marker label key identifying objects owned by the scheduler.
pub const MARKER: &str = "com.df.cron";
/// Value of the marker label.
pub const MARKER_VALUE: &str = "true";
/// Label holding the owning job's name.
pub const NAME: &str = "com.df.cron.name";
/// Label holding the job's schedule.
pub const SCHEDULE: &str = "com.df.cron.schedule";
/// Label holding the fully rendered create invocation.
pub const COMMAND: &str = "com.df.cron.command";
/// Label holding the job's create flags as a JSON array.
pub const ARGS: &str = "com.df.cron.args";
/// Label holding the job's own command, verbatim.
pub const RUN_COMMAND: &str = "com.df.cron.run-command";

/// A conjunction of label constraints used to select objects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelFilter {
    constraints: Vec<(String, Option<String>)>,
}

impl LabelFilter {
    /// An empty filter matching every object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Select every object owned by the scheduler.
    pub fn marker() -> Self {
        Self::new().with(MARKER, MARKER_VALUE)
    }

    /// Select every run object of one job.
    pub fn job(name: &str) -> Self {
        Self::marker().with(NAME, name)
    }

    /// Require `key=value`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.constraints.push((key.into(), Some(value.into())));
        self
    }

    /// Require that `key` is present, whatever its value.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.constraints.push((key.into(), None));
        self
    }

    pub fn constraints(&self) -> &[(String, Option<String>)] {
        &self.constraints
    }

    /// Render the constraints in `key=value` / `key` form.
    pub fn to_selectors(&self) -> Vec<String> {
        self.constraints
            .iter()
            .map(|(k, v)| match v {
                Some(v) => format!("{}={}", k, v),
                None => k.clone(),
            })
            .collect()
    }

    /// Check a label set against the filter.
    pub fn matches(&self, labels: &HashMap<String, String>) -> bool {
        self.constraints.iter().all(|(k, v)| match (labels.get(k), v) {
            (Some(actual), Some(expected)) => actual == expected,
            (Some(_), None) => true,
            (None, _) => false,
        })
    }
}

/// Job parameters recovered from an object's labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedLabels {
    pub name: String,
    pub schedule: String,
    /// The job's command. Without a [`RUN_COMMAND`] label this is the full
    /// create invocation from [`COMMAND`].
    pub command: String,
    pub args: Vec<String>,
    /// Value of the [`COMMAND`] label.
    pub invocation: String,
    /// The [`COMMAND`] label again, set only for objects written without
    /// [`RUN_COMMAND`].
    pub legacy_invocation: Option<String>,
}

/// Why an object's labels could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelProblem {
    /// The marker label is absent or not `true`.
    NotOwned,
    /// A required key is absent.
    Missing(&'static str),
    /// The job name label is empty.
    EmptyName,
    /// A label value has the wrong format.
    Malformed(&'static str),
}

impl std::fmt::Display for LabelProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LabelProblem::NotOwned => write!(f, "missing marker label {}={}", MARKER, MARKER_VALUE),
            LabelProblem::Missing(key) => write!(f, "missing label {}", key),
            LabelProblem::EmptyName => write!(f, "empty label {}", NAME),
            LabelProblem::Malformed(key) => write!(f, "malformed label {}", key),
        }
    }
}

/// Encode create flags for the [`ARGS`] label.
pub fn encode_args(args: &[String]) -> String {
    serde_json::to_string(args).unwrap_or_else(|_| "[]".to_string())
}

/// Decode the job parameters stored on an object.
///
/// The schedule label may hold an empty value (one-shot jobs), but it must be present.
pub fn decode(labels: &HashMap<String, String>) -> Result<DecodedLabels, LabelProblem> {
    if labels.get(MARKER).map(String::as_str) != Some(MARKER_VALUE) {
        return Err(LabelProblem::NotOwned);
    }
    let name = labels.get(NAME).ok_or(LabelProblem::Missing(NAME))?;
    if name.is_empty() {
        return Err(LabelProblem::EmptyName);
    }
    let schedule = labels.get(SCHEDULE).ok_or(LabelProblem::Missing(SCHEDULE))?;
    let invocation = labels.get(COMMAND).ok_or(LabelProblem::Missing(COMMAND))?;

    let args = match labels.get(ARGS) {
        Some(raw) => serde_json::from_str::<Vec<String>>(raw)
            .map_err(|_| LabelProblem::Malformed(ARGS))?,
        None => Vec::new(),
    };
    let (command, legacy_invocation) = match labels.get(RUN_COMMAND) {
        Some(command) => (command.clone(), None),
        None => (invocation.clone(), Some(invocation.clone())),
    };

    Ok(DecodedLabels {
        name: name.clone(),
        schedule: schedule.clone(),
        command,
        args,
        invocation: invocation.clone(),
        legacy_invocation,
    })
}
