//! Configuration validation.

use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
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

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
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
        Self::validate_jobs(config, &mut result);
        Self::validate_remote(config, &mut result);
        Self::validate_credential(config, &mut result);

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

    fn validate_jobs(config: &Config, result: &mut ValidationResult) {
        if config.jobs.observation_window_secs == 0 {
            result.add_warning(ValidationWarning::new(
                "jobs.observation_window_secs",
                "Finished jobs will be removed before a client can observe them",
            ));
        }

        if config.jobs.observation_window_secs > 86_400 {
            result.add_warning(ValidationWarning::new(
                "jobs.observation_window_secs",
                "Observation window is longer than a day, finished jobs will pile up in memory",
            ));
        }
    }

    fn validate_remote(config: &Config, result: &mut ValidationResult) {
        let endpoints = [
            ("remote.resolve_url", "CADENCE_RESOLVE_URL", &config.remote.resolve_url),
            ("remote.token_url", "CADENCE_TOKEN_URL", &config.remote.token_url),
            ("remote.publish_url", "CADENCE_PUBLISH_URL", &config.remote.publish_url),
        ];

        for (path, env_var, url) in endpoints {
            if url.is_empty() {
                result.add_error(ValidationError::new(
                    path,
                    format!("Endpoint must be configured, set {} or {}", env_var, path),
                ));
            } else if !url.starts_with("http://") && !url.starts_with("https://") {
                result.add_error(ValidationError::new(
                    path,
                    "Endpoint must start with http:// or https://",
                ));
            }
        }

        if config.remote.link_base.is_empty() {
            result.add_warning(ValidationWarning::new(
                "remote.link_base",
                "link_base is empty, the bare content id will be published",
            ));
        }

        if config.remote.timeout_secs == 0 {
            result.add_error(ValidationError::new(
                "remote.timeout_secs",
                "timeout_secs must be greater than 0",
            ));
        }
    }

    fn validate_credential(config: &Config, result: &mut ValidationResult) {
        if config.credential.required_key.is_empty() {
            result.add_error(ValidationError::new(
                "credential.required_key",
                "Required credential key cannot be empty",
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
