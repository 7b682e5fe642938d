//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub jobs: JobsConfig,

    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub credential: CredentialConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP listener configuration.
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
    5000
}

/// Job lifecycle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    /// How long a finished job stays listed before it is removed.
    #[serde(default = "default_observation_window_secs")]
    pub observation_window_secs: u64,

    /// Keep failed jobs listed for the observation window instead of
    /// dropping them on the failing tick.
    #[serde(default)]
    pub retain_failed: bool,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            observation_window_secs: default_observation_window_secs(),
            retain_failed: false,
        }
    }
}

impl JobsConfig {
    pub fn observation_window(&self) -> Duration {
        Duration::from_secs(self.observation_window_secs)
    }
}

fn default_observation_window_secs() -> u64 {
    300
}

/// External service endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Form endpoint that maps a target URL onto a content id.
    #[serde(default)]
    pub resolve_url: String,

    /// Page whose body carries the bearer token for a credential.
    #[serde(default)]
    pub token_url: String,

    /// Write endpoint hit once per tick.
    #[serde(default)]
    pub publish_url: String,

    /// Link prefix the content id is appended to when publishing.
    #[serde(default)]
    pub link_base: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            resolve_url: String::new(),
            token_url: String::new(),
            publish_url: String::new(),
            link_base: String::new(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl RemoteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_user_agent() -> String {
    format!("cadence/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    30
}

/// Credential blob conventions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialConfig {
    /// Entry that must be present for a blob to be accepted.
    #[serde(default = "default_required_key")]
    pub required_key: String,

    /// Entry holding the account id reported for guard sessions.
    #[serde(default = "default_user_key")]
    pub user_key: String,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            required_key: default_required_key(),
            user_key: default_user_key(),
        }
    }
}

fn default_required_key() -> String {
    "sb".to_string()
}

fn default_user_key() -> String {
    "c_user".to_string()
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset.
    #[serde(default = "default_level")]
    pub level: String,

    /// Directory for daily rotated log files. Console only when unset.
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

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
