//! Cadence - bounded interval job runner
//!
//! Main entry point for the Cadence server.

use clap::Parser;

mod cli;
mod server;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = server::load_config(&cli)?;
    server::init_tracing(&config.logging)?;

    server::run_server(config).await
}
