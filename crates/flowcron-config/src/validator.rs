//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::Config;

const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Turn the first error into a [`ConfigError`].
    pub fn into_result(self) -> Result<(), ConfigError> {
        match self.errors.into_iter().next() {
            Some(e) => Err(ConfigError::InvalidValue {
                field: e.path,
                message: e.message,
            }),
            None => Ok(()),
        }
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();
        Self::validate_server(config, &mut result);
        Self::validate_docker(config, &mut result);
        Self::validate_logging(config, &mut result);
        result
    }

    fn validate_server(config: &Config, result: &mut ValidationResult) {
        if config.server.port == 0 {
            result.add_error(ValidationError::new("server.port", "Port cannot be 0"));
        }
        if config.server.host.is_empty() {
            result.add_error(ValidationError::new("server.host", "Host cannot be empty"));
        }
    }

    fn validate_docker(config: &Config, result: &mut ValidationResult) {
        if config.docker.binary.trim().is_empty() {
            result.add_error(ValidationError::new(
                "docker.binary",
                "Docker binary cannot be empty",
            ));
        }
        if let Some(host) = &config.docker.host {
            if host.trim().is_empty() {
                result.add_error(ValidationError::new(
                    "docker.host",
                    "Docker host cannot be empty when set",
                ));
            }
        }
    }

    fn validate_logging(config: &Config, result: &mut ValidationResult) {
        // Full filter directives such as `flowcron=debug,info` are passed through.
        let level = config.logging.level.trim();
        if level.is_empty() {
            result.add_error(ValidationError::new("logging.level", "Level cannot be empty"));
        } else if !level.contains('=')
            && !level.contains(',')
            && !LEVELS.contains(&level.to_ascii_lowercase().as_str())
        {
            result.add_error(ValidationError::new(
                "logging.level",
                format!("Unknown level '{}', valid values: {:?}", level, LEVELS),
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
