//! CLI definitions for Cadence.

use std::path::PathBuf;

use clap::Parser;

/// Cadence CLI.
#[derive(Debug, Parser)]
#[command(name = "cadence")]
#[command(about = "Bounded interval job runner for remote write operations")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path. Defaults apply when the file is missing.
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Server host, overrides `server.host`
    #[arg(long)]
    pub host: Option<String>,

    /// Server port, overrides `server.port`
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Content id lookup endpoint, overrides `remote.resolve_url` (required)
    #[arg(long, env = "CADENCE_RESOLVE_URL")]
    pub resolve_url: Option<String>,

    /// Access token page, overrides `remote.token_url` (required)
    #[arg(long, env = "CADENCE_TOKEN_URL")]
    pub token_url: Option<String>,

    /// Write endpoint, overrides `remote.publish_url` (required)
    #[arg(long, env = "CADENCE_PUBLISH_URL")]
    pub publish_url: Option<String>,

    /// Link prefix for published content ids, overrides `remote.link_base`
    #[arg(long, env = "CADENCE_LINK_BASE")]
    pub link_base: Option<String>,
}
