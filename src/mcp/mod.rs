// src/mcp/mod.rs
// MCP Server implementation

pub mod handler;
pub mod tools;

use std::path::PathBuf;
use std::sync::Arc;

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    schemars, tool, tool_router,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::exec::{HdcInvoker, HvigorInvoker};

/// MCP Server state
#[derive(Clone)]
pub struct HarmonyServer {
    pub hdc: Arc<HdcInvoker>,
    pub hvigor: Arc<HvigorInvoker>,
    /// Log file path reported to clients in failure payloads
    pub log_file: PathBuf,
    tool_router: ToolRouter<Self>,
}

impl HarmonyServer {
    pub fn new(hdc: Arc<HdcInvoker>, hvigor: Arc<HvigorInvoker>, log_file: PathBuf) -> Self {
        Self {
            hdc,
            hvigor,
            log_file,
            tool_router: Self::tool_router(),
        }
    }

    /// Tool outcomes cross the transport as JSON text. Expected failures
    /// (bad arguments, missing executables) become a structured failure
    /// payload instead of a protocol error, so clients always get a body
    /// they can inspect.
    fn render(&self, tool: &str, result: crate::error::Result<Value>) -> Result<String, String> {
        let payload = match result {
            Ok(value) => value,
            Err(e) => {
                let trace = error_chain(&e);
                self.failure_payload(tool, &e.to_string(), e.kind(), Some(&trace))
            }
        };
        serde_json::to_string(&payload).map_err(|e| e.to_string())
    }

    pub(crate) fn failure_payload(
        &self,
        tool: &str,
        error: &str,
        error_type: &str,
        traceback: Option<&str>,
    ) -> Value {
        let mut payload = json!({
            "success": false,
            "error": error,
            "error_type": error_type,
            "tool": tool,
            "log_file": self.log_file.to_string_lossy(),
        });
        if let Some(trace) = traceback {
            payload["traceback"] = json!(trace);
        }
        payload
    }
}

/// Diagnostic text for the failure payload's `traceback` field: the error
/// kind plus the full cause chain.
fn error_chain(e: &crate::error::ToolsError) -> String {
    let mut text = format!("{}: {}", e.kind(), e);
    let mut source = std::error::Error::source(e);
    while let Some(cause) = source {
        text.push_str("\ncaused by: ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

// Request types for tools with parameters
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ShellRequest {
    #[schemars(description = "Shell command to run on the device")]
    pub command: String,
    #[schemars(description = "Target device ID (from list_targets). Omit for the default device.")]
    pub device: Option<String>,
    #[schemars(description = "Timeout in seconds (default 120, 0 disables)")]
    pub timeout: Option<f64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct HvigorCleanRequest {
    #[schemars(description = "HarmonyOS project root directory")]
    pub project_dir: String,
    #[schemars(description = "Pass --no-daemon (default true)")]
    pub no_daemon: Option<bool>,
    #[schemars(description = "Timeout in seconds (default 900, 0 disables)")]
    pub timeout: Option<f64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct HvigorAssembleRequest {
    #[schemars(description = "HarmonyOS project root directory")]
    pub project_dir: String,
    #[schemars(description = "Package type: hap/hsp/har/app")]
    pub target_type: String,
    #[schemars(description = "Module name (for hap/hsp/har)")]
    pub module: Option<String>,
    #[schemars(description = "Product name (default 'default')")]
    pub product: Option<String>,
    #[schemars(description = "Build mode: debug/release (default debug)")]
    pub build_mode: Option<String>,
    #[schemars(description = "Pass --no-daemon (default true)")]
    pub no_daemon: Option<bool>,
    #[schemars(description = "Timeout in seconds (default 900, 0 disables)")]
    pub timeout: Option<f64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct FindOutputRequest {
    #[schemars(description = "HarmonyOS project root directory")]
    pub project_dir: String,
    #[schemars(description = "Artifact type: hap/app (default hap)")]
    pub target_type: Option<String>,
    #[schemars(description = "Module name (default 'entry')")]
    pub module: Option<String>,
    #[schemars(description = "Build mode: debug/release (default debug)")]
    pub build_mode: Option<String>,
    #[schemars(description = "Product name (default 'default')")]
    pub product: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ScreenshotRequest {
    #[schemars(description = "Project directory the screenshot is saved under")]
    pub project_dir: String,
    #[schemars(description = "Subdirectory of project_dir to save into")]
    pub output_path: Option<String>,
    #[schemars(description = "File name; .jpeg is enforced. Default: timestamped name")]
    pub filename: Option<String>,
    #[schemars(description = "Target device ID")]
    pub device: Option<String>,
    #[schemars(description = "Per-step timeout in seconds (default 30)")]
    pub timeout: Option<f64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct InstallAppRequest {
    #[schemars(description = "Path to the signed HAP on this machine")]
    pub hap_path: String,
    #[schemars(description = "Bundle name, needed for force-stop and auto-start")]
    pub bundle_name: Option<String>,
    #[schemars(description = "Ability to launch (default EntryAbility)")]
    pub ability_name: Option<String>,
    #[schemars(description = "Launch the app after install (default true)")]
    pub auto_start: Option<bool>,
    #[schemars(description = "Force-stop a running instance first (default true)")]
    pub force_stop: Option<bool>,
    #[schemars(description = "Target device ID")]
    pub device: Option<String>,
    #[schemars(description = "Per-step timeout in seconds (default 120)")]
    pub timeout: Option<f64>,
}

#[tool_router]
impl HarmonyServer {
    #[tool(description = "List connected HarmonyOS devices and emulators.")]
    async fn list_targets(&self) -> Result<String, String> {
        let result = tools::device::list_targets(self).await;
        self.render("list_targets", result)
    }

    #[tool(description = "Run a shell command on the target device via hdc shell.")]
    async fn shell(&self, Parameters(req): Parameters<ShellRequest>) -> Result<String, String> {
        let result = tools::device::shell(self, req).await;
        self.render("shell", result)
    }

    #[tool(description = "Clean build artifacts of a HarmonyOS project with hvigorw.")]
    async fn hvigor_clean(
        &self,
        Parameters(req): Parameters<HvigorCleanRequest>,
    ) -> Result<String, String> {
        let result = tools::build::clean(self, req).await;
        self.render("hvigor_clean", result)
    }

    #[tool(description = "Build a HarmonyOS package (HAP/HSP/HAR/APP) with hvigorw.")]
    async fn hvigor_assemble(
        &self,
        Parameters(req): Parameters<HvigorAssembleRequest>,
    ) -> Result<String, String> {
        let result = tools::build::assemble(self, req).await;
        self.render("hvigor_assemble", result)
    }

    #[tool(description = "Locate the HAP/APP a hvigor build produced (or where it would be).")]
    async fn hvigor_find_output(
        &self,
        Parameters(req): Parameters<FindOutputRequest>,
    ) -> Result<String, String> {
        let result = tools::build::find_output(req);
        self.render("hvigor_find_output", result)
    }

    #[tool(description = "Capture a device screenshot and save it into the project directory.")]
    async fn hdc_screenshot(
        &self,
        Parameters(req): Parameters<ScreenshotRequest>,
    ) -> Result<String, String> {
        let result = tools::device::screenshot(self, req).await;
        self.render("hdc_screenshot", result)
    }

    #[tool(description = "Install a HAP on the device (stop, stage, bm install, cleanup, start).")]
    async fn hdc_install_app(
        &self,
        Parameters(req): Parameters<InstallAppRequest>,
    ) -> Result<String, String> {
        let result = tools::device::install_app(self, req).await;
        self.render("hdc_install_app", result)
    }
}
