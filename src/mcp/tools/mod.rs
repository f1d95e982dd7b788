// src/mcp/tools/mod.rs
// Tool implementations, grouped by the CLI they wrap

pub mod build;
pub mod device;

use std::time::Duration;

use serde_json::Value;

use crate::error::{Result, ToolsError};
use crate::exec::{HdcRequest, HvigorRequest};
use crate::mcp::HarmonyServer;

/// Convert a seconds knob from the wire into a deadline. Zero or negative
/// disables the deadline.
pub(crate) fn timeout_from_secs(secs: f64) -> Option<Duration> {
    (secs > 0.0).then(|| Duration::from_secs_f64(secs))
}

/// Run one hdc command and hand back the transport payload.
pub(crate) async fn execute_hdc(
    server: &HarmonyServer,
    args: Vec<String>,
    device: Option<String>,
    timeout_secs: f64,
) -> Result<Value> {
    if args.is_empty() {
        return Err(ToolsError::InvalidArguments(
            "hdc command cannot be empty".to_string(),
        ));
    }

    let mut request = HdcRequest::new(args);
    request.device = device;
    request.timeout = timeout_from_secs(timeout_secs);

    let result = server.hdc.run(request).await?;
    Ok(result.to_payload())
}

/// Run one hvigorw command inside a project and hand back the payload.
pub(crate) async fn execute_hvigor(
    server: &HarmonyServer,
    args: Vec<String>,
    project_dir: &str,
    timeout_secs: f64,
) -> Result<Value> {
    if args.is_empty() {
        return Err(ToolsError::InvalidArguments(
            "hvigor command cannot be empty".to_string(),
        ));
    }

    let mut request = HvigorRequest::new(args, project_dir);
    request.timeout = timeout_from_secs(timeout_secs);

    let result = server.hvigor.run(request).await?;
    Ok(result.to_payload())
}

/// Pull the return code out of an invocation payload.
pub(crate) fn payload_returncode(payload: &Value) -> i64 {
    payload["returncode"].as_i64().unwrap_or(-1)
}

/// Pull a text field out of an invocation payload.
pub(crate) fn payload_text<'a>(payload: &'a Value, field: &str) -> &'a str {
    payload[field].as_str().unwrap_or("")
}
