//! Server initialization and startup logic for Cadence.

use std::path::Path;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cadence_api::{
    ApiServer, AppState, CredentialRules, JobRegistry, JobScheduler, SchedulerSettings,
    ServerSettings,
};
use cadence_config::{Config, ConfigLoader, ConfigValidator, LoggingConfig};
use cadence_protocols::{ContentResolver, Publisher};
use cadence_remote_http::{HttpRemote, HttpRemoteSettings};

use crate::cli::Cli;

/// Initialize tracing with console output and, when a log directory is
/// configured, a daily rotated file.
///
/// `RUST_LOG` takes precedence over `logging.level`.
pub(crate) fn init_tracing(logging: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&logging.level))?;

    let file_layer = match &logging.dir {
        Some(dir) => {
            let dir = ConfigLoader::expand_path(&dir.to_string_lossy());
            std::fs::create_dir_all(&dir)?;

            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("cadence")
                .filename_suffix("log")
                .max_log_files(30)
                .build(&dir)?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            // The writer flushes on drop; keep it for the process lifetime.
            static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
                std::sync::OnceLock::new();
            let _ = GUARD.set(guard);

            Some(fmt::layer().with_writer(non_blocking).with_ansi(false))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .init();

    Ok(())
}

/// Load the configuration file and apply CLI overrides.
pub(crate) fn load_config(cli: &Cli) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = ConfigLoader::load_or_default(&cli.config)?;
    if let Some(host) = &cli.host {
        config.server.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let remote = [
        (&cli.resolve_url, &mut config.remote.resolve_url),
        (&cli.token_url, &mut config.remote.token_url),
        (&cli.publish_url, &mut config.remote.publish_url),
        (&cli.link_base, &mut config.remote.link_base),
    ];
    for (value, field) in remote {
        if let Some(value) = value {
            *field = value.clone();
        }
    }
    Ok(config)
}

/// Validate the configuration, logging every finding.
fn check_config(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let result = ConfigValidator::validate(config);
    for warning in &result.warnings {
        warn!("Config {}: {}", warning.path, warning.message);
    }
    for err in &result.errors {
        error!("Config {}: {}", err.path, err.message);
    }
    if !result.is_valid() {
        let details: Vec<String> = result
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.path, e.message))
            .collect();
        return Err(format!("invalid configuration: {}", details.join("; ")).into());
    }
    Ok(())
}

/// Build the shared application state from a validated configuration.
pub(crate) fn build_state(config: &Config) -> Result<Arc<AppState>, Box<dyn std::error::Error>> {
    let remote = Arc::new(HttpRemote::new(HttpRemoteSettings {
        resolve_url: config.remote.resolve_url.clone(),
        token_url: config.remote.token_url.clone(),
        publish_url: config.remote.publish_url.clone(),
        link_base: config.remote.link_base.clone(),
        user_agent: config.remote.user_agent.clone(),
        timeout: config.remote.timeout(),
    })?);
    let resolver: Arc<dyn ContentResolver> = remote.clone();
    let publisher: Arc<dyn Publisher> = remote;

    let scheduler = Arc::new(JobScheduler::new(
        Arc::new(JobRegistry::new()),
        resolver.clone(),
        publisher,
        SchedulerSettings {
            observation_window: config.jobs.observation_window(),
            retain_failed: config.jobs.retain_failed,
            write_grace: config.remote.timeout(),
        },
    ));

    let credentials = CredentialRules {
        required_key: config.credential.required_key.clone(),
        user_key: config.credential.user_key.clone(),
    };

    Ok(Arc::new(AppState::new(scheduler, resolver, credentials)))
}

/// Run the server until Ctrl-C, then stop every job.
pub(crate) async fn run_server(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting Cadence v{}", env!("CARGO_PKG_VERSION"));
    check_config(&config)?;

    let state = build_state(&config)?;
    let server = ApiServer::new(
        ServerSettings::new(config.server.host.clone(), config.server.port),
        state.clone(),
    );

    let result = server.run(shutdown_signal()).await;

    state.scheduler.shutdown();
    info!("Cadence stopped");
    result
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal"),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn remote_config(config: &mut Config) {
        config.remote.resolve_url = "http://127.0.0.1:9/resolve".to_string();
        config.remote.token_url = "http://127.0.0.1:9/token".to_string();
        config.remote.publish_url = "http://127.0.0.1:9/publish".to_string();
        config.remote.link_base = "http://127.0.0.1:9/c/".to_string();
    }

    #[test]
    fn test_load_config_missing_file_uses_defaults() {
        let cli = Cli::parse_from(["cadence", "--config", "/nonexistent/cadence.toml"]);
        let config = load_config(&cli).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.jobs.observation_window_secs, 300);
    }

    #[test]
    fn test_load_config_applies_overrides() {
        let cli = Cli::parse_from([
            "cadence",
            "--config",
            "/nonexistent/cadence.toml",
            "--host",
            "127.0.0.1",
            "--port",
            "7000",
        ]);
        let config = load_config(&cli).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 7000);
    }

    #[test]
    fn test_check_config_rejects_missing_endpoints() {
        let err = check_config(&Config::default()).unwrap_err().to_string();
        assert!(err.contains("CADENCE_RESOLVE_URL"));
        assert!(err.contains("CADENCE_TOKEN_URL"));
        assert!(err.contains("CADENCE_PUBLISH_URL"));
    }

    #[test]
    fn test_load_config_applies_remote_overrides() {
        let cli = Cli::parse_from([
            "cadence",
            "--config",
            "/nonexistent/cadence.toml",
            "--resolve-url",
            "http://127.0.0.1:9/resolve",
            "--token-url",
            "http://127.0.0.1:9/token",
            "--publish-url",
            "http://127.0.0.1:9/publish",
        ]);
        let config = load_config(&cli).unwrap();
        assert_eq!(config.remote.resolve_url, "http://127.0.0.1:9/resolve");
        assert_eq!(config.remote.publish_url, "http://127.0.0.1:9/publish");
        assert!(check_config(&config).is_ok());
    }

    #[test]
    fn test_build_state() {
        let mut config = Config::default();
        remote_config(&mut config);
        config.credential.required_key = "session".to_string();
        assert!(check_config(&config).is_ok());

        let state = build_state(&config).unwrap();
        assert_eq!(state.credentials.required_key, "session");
        assert!(state.registry().is_empty());
    }
}
