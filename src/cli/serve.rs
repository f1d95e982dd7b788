// src/cli/serve.rs
// MCP server initialization and main loops (stdio and streamable HTTP)

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use rmcp::transport::streamable_http_server::{
    StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::EnvConfig;
use crate::exec::{HdcInvoker, HvigorInvoker};
use crate::mcp::HarmonyServer;

/// Build the server state: resolve both executables once and inject them.
pub fn build_server(config: &EnvConfig, log_file: PathBuf) -> HarmonyServer {
    let hdc = Arc::new(HdcInvoker::new(config.hdc_path.as_deref()));
    let hvigor = Arc::new(HvigorInvoker::new(config.hvigorw_path.as_deref()));

    info!("hdc executable: {}", hdc.executable().display());
    info!("hvigorw executable: {}", hvigor.executable().display());
    info!("log file: {}", log_file.display());
    info!(
        "tools: list_targets, shell, hvigor_clean, hvigor_assemble, \
         hvigor_find_output, hdc_screenshot, hdc_install_app"
    );

    HarmonyServer::new(hdc, hvigor, log_file)
}

/// Run the MCP server with stdio transport
pub async fn run_stdio_server(config: &EnvConfig, log_file: PathBuf) -> Result<()> {
    let server = build_server(config, log_file);
    info!("starting MCP server on stdio");

    let transport = rmcp::transport::io::stdio();
    let service = rmcp::serve_server(server, transport).await?;
    service.waiting().await?;

    Ok(())
}

/// Run the MCP server over streamable HTTP, mounted at /mcp
pub async fn run_http_server(
    config: &EnvConfig,
    log_file: PathBuf,
    host: &str,
    port: u16,
) -> Result<()> {
    let server = build_server(config, log_file);

    // Service factory - hands the shared state to each MCP session
    let session_server = server.clone();
    let service_factory = move || Ok(session_server.clone());

    let session_manager = Arc::new(LocalSessionManager::default());
    let http_config = StreamableHttpServerConfig {
        sse_keep_alive: Some(Duration::from_secs(15)),
        sse_retry: None,
        stateful_mode: true,
        cancellation_token: CancellationToken::new(),
    };
    let mcp_service = StreamableHttpService::new(service_factory, session_manager, http_config);

    let app = axum::Router::new().nest_service("/mcp", mcp_service);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("MCP server listening on http://{}/mcp", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Print the resolved executables and configuration report.
pub fn run_check(config: &EnvConfig) {
    let hdc = HdcInvoker::new(config.hdc_path.as_deref());
    let hvigor = HvigorInvoker::new(config.hvigorw_path.as_deref());

    println!("hdc:     {}", hdc.executable().display());
    println!("hvigorw: {}", hvigor.executable().display());
    println!("{}", config.validate().report());
}
