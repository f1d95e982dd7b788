// src/main.rs
// harmony-tools - MCP service exposing HarmonyOS hdc and hvigorw tooling

use anyhow::Result;
use clap::Parser;
use tracing::warn;

use harmony_tools::cli::{Cli, Commands, Transport, serve};
use harmony_tools::config::EnvConfig;
use harmony_tools::logging;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env files (global first, then project - project overrides)
    if let Some(home) = dirs::home_dir() {
        let _ = dotenvy::from_path(home.join(".harmony-tools/.env"));
    }
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = EnvConfig::load();

    if let Some(Commands::Check) = cli.command {
        serve::run_check(&config);
        return Ok(());
    }

    let log = logging::init(&config)?;
    let log_file = log.log_file();
    // Keep the non-blocking file writer alive until the process exits
    let _log_guard = log.guard;

    for warning in config.validate().warnings {
        warn!("{}", warning);
    }

    match cli.command {
        None => serve::run_stdio_server(&config, log_file).await?,
        Some(Commands::Serve {
            transport,
            host,
            port,
        }) => match transport {
            Transport::Stdio => serve::run_stdio_server(&config, log_file).await?,
            Transport::Http => serve::run_http_server(&config, log_file, &host, port).await?,
        },
        // Handled before logging init
        Some(Commands::Check) => {}
    }

    Ok(())
}
