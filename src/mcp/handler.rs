// src/mcp/handler.rs
// ServerHandler impl: info, tool listing, and instrumented tool dispatch

use futures::FutureExt;
use rmcp::{
    ErrorData, ServerHandler,
    handler::server::tool::ToolCallContext,
    model::{
        CallToolRequestParam, CallToolResult, Content, ListToolsResult, PaginatedRequestParam,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
};
use serde_json::Value;
use std::panic::AssertUnwindSafe;
use tracing::{error, info, warn};

use crate::exec::output::truncate_chars;

use super::HarmonyServer;

impl ServerHandler for HarmonyServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: rmcp::model::Implementation {
                name: "harmony-tools".into(),
                title: Some("Harmony Tools - hdc and hvigorw for MCP clients".into()),
                version: env!("CARGO_PKG_VERSION").into(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Harmony Tools wraps the HarmonyOS hdc device CLI and hvigorw build wrapper. \
                 Use list_targets to discover devices, shell for device commands, and the \
                 hvigor_* tools to build projects."
                    .into(),
            ),
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, ErrorData>> + Send + '_ {
        std::future::ready(Ok(ListToolsResult {
            tools: self.tool_router.list_all(),
            next_cursor: None,
            meta: None,
        }))
    }

    fn call_tool(
        &self,
        request: CallToolRequestParam,
        context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, ErrorData>> + Send + '_ {
        async move {
            let tool_name = request.name.to_string();
            let request_id = short_request_id();
            let start = std::time::Instant::now();

            info!(request = %request_id, tool = %tool_name, "tool call received");
            log_arguments(&request_id, request.arguments.as_ref());
            let logged_args = request.arguments.clone();

            let dispatch = async {
                let ctx = ToolCallContext::new(self, request, context);
                self.tool_router.call(ctx).await
            };
            let result = dispatch_guarded(self, &tool_name, &request_id, dispatch).await;
            let duration_ms = start.elapsed().as_millis() as u64;

            match result {
                Ok(call_result) => {
                    let outcome = classify(&call_result);
                    if outcome.success {
                        info!(
                            request = %request_id,
                            tool = %tool_name,
                            elapsed_ms = duration_ms,
                            status = %outcome.status,
                            "tool call completed"
                        );
                    } else {
                        warn!(
                            request = %request_id,
                            tool = %tool_name,
                            elapsed_ms = duration_ms,
                            status = %outcome.status,
                            "tool call reported failure"
                        );
                        if let Some(error) = &outcome.error {
                            warn!(request = %request_id, "  error: {}", truncate_chars(error, 500));
                        }
                        log_arguments(&request_id, logged_args.as_ref());
                    }
                    Ok(call_result)
                }
                Err(e) => {
                    // Router-level failure (unknown tool, malformed params)
                    warn!(
                        request = %request_id,
                        tool = %tool_name,
                        elapsed_ms = duration_ms,
                        "tool dispatch failed: {}", e.message
                    );
                    log_arguments(&request_id, logged_args.as_ref());
                    let payload = self.failure_payload(
                        &tool_name,
                        &e.message,
                        "ProtocolError",
                        Some(&e.message),
                    );
                    Ok(failure_result(&payload))
                }
            }
        }
    }
}

/// Run a tool dispatch with crash isolation: a panicking tool comes back to
/// the client as a structured failure payload instead of tearing down the
/// server.
async fn dispatch_guarded<F>(
    server: &HarmonyServer,
    tool_name: &str,
    request_id: &str,
    dispatch: F,
) -> Result<CallToolResult, ErrorData>
where
    F: std::future::Future<Output = Result<CallToolResult, ErrorData>>,
{
    match AssertUnwindSafe(dispatch).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => {
            let message = panic_message(panic);
            error!(request = %request_id, tool = %tool_name, "tool panicked: {}", message);
            let payload = server.failure_payload(tool_name, &message, "Panic", Some(&message));
            Ok(failure_result(&payload))
        }
    }
}

/// Short hex ID correlating the log lines of one call.
fn short_request_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

fn failure_result(payload: &Value) -> CallToolResult {
    let text = serde_json::to_string(payload).unwrap_or_else(|_| payload.to_string());
    CallToolResult::success(vec![Content::text(text)])
}

fn log_arguments(request_id: &str, arguments: Option<&serde_json::Map<String, Value>>) {
    match arguments {
        Some(map) if !map.is_empty() => {
            for (key, value) in map {
                info!(request = %request_id, "  {} = {}", key, format_argument(value));
            }
        }
        _ => info!(request = %request_id, "  (no arguments)"),
    }
}

/// Render one argument for the log, truncating long strings so a giant
/// shell command or path list doesn't flood the file.
fn format_argument(value: &Value) -> String {
    let rendered = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    truncate_chars(&rendered, 200)
}

struct Outcome {
    success: bool,
    status: String,
    error: Option<String>,
}

/// Decide whether a tool result was a success, for logging. An explicit
/// `success` key wins, then a zero `returncode`; anything unrecognized
/// counts as success.
fn classify(result: &CallToolResult) -> Outcome {
    if result.is_error == Some(true) {
        let error = result
            .content
            .first()
            .and_then(|c| c.as_text())
            .map(|t| t.text.to_string());
        return Outcome {
            success: false,
            status: "error".to_string(),
            error,
        };
    }
    let Some(payload) = result
        .content
        .first()
        .and_then(|c| c.as_text())
        .and_then(|t| serde_json::from_str::<Value>(&t.text).ok())
    else {
        return Outcome {
            success: true,
            status: "completed".to_string(),
            error: None,
        };
    };
    let (success, status) = classify_payload(&payload);
    Outcome {
        success,
        status,
        error: payload
            .get("error")
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}

fn classify_payload(payload: &Value) -> (bool, String) {
    if let Some(success) = payload.get("success").and_then(Value::as_bool) {
        let status = if success { "success" } else { "failed" };
        return (success, status.to_string());
    }
    if let Some(code) = payload.get("returncode").and_then(Value::as_i64) {
        let timed_out = payload
            .get("timed_out")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if timed_out {
            return (false, "timed out".to_string());
        }
        return (code == 0, format!("returncode={}", code));
    }
    (true, "completed".to_string())
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_explicit_success_key_wins() {
        assert_eq!(
            classify_payload(&json!({"success": true, "returncode": 7})),
            (true, "success".to_string())
        );
        assert_eq!(
            classify_payload(&json!({"success": false, "returncode": 0})),
            (false, "failed".to_string())
        );
    }

    #[test]
    fn test_classify_returncode_fallback() {
        assert_eq!(
            classify_payload(&json!({"returncode": 0})),
            (true, "returncode=0".to_string())
        );
        assert_eq!(
            classify_payload(&json!({"returncode": 3})),
            (false, "returncode=3".to_string())
        );
    }

    #[test]
    fn test_classify_timeout() {
        let (success, status) =
            classify_payload(&json!({"returncode": -1, "timed_out": true}));
        assert!(!success);
        assert_eq!(status, "timed out");
    }

    #[test]
    fn test_classify_unrecognized_is_success() {
        assert_eq!(
            classify_payload(&json!({"path": "/a/b.hap", "exists": true})),
            (true, "completed".to_string())
        );
    }

    #[test]
    fn test_short_request_id_is_eight_hex_chars() {
        let id = short_request_id();
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_format_argument_truncates_long_strings() {
        let long = "y".repeat(300);
        let rendered = format_argument(&Value::String(long));
        assert!(rendered.contains("... (length: 300)"));

        let short = format_argument(&json!({"k": 1}));
        assert_eq!(short, "{\"k\":1}");
    }

    fn test_server() -> HarmonyServer {
        use crate::exec::{HdcInvoker, HvigorInvoker};
        use std::sync::Arc;
        HarmonyServer::new(
            Arc::new(HdcInvoker::new(Some("/bin/echo"))),
            Arc::new(HvigorInvoker::new(Some("/bin/sh"))),
            std::path::PathBuf::from("/tmp/harmony-tools.log"),
        )
    }

    fn payload_of(result: &CallToolResult) -> Value {
        let text = result
            .content
            .first()
            .and_then(|c| c.as_text())
            .map(|t| t.text.to_string())
            .unwrap();
        serde_json::from_str(&text).unwrap()
    }

    async fn panicking_dispatch() -> Result<CallToolResult, ErrorData> {
        panic!("boom");
    }

    #[tokio::test]
    async fn test_panicking_dispatch_becomes_failure_payload() {
        let server = test_server();
        let result = dispatch_guarded(&server, "shell", "deadbeef", panicking_dispatch())
            .await
            .unwrap();

        let payload = payload_of(&result);
        assert_eq!(payload["success"], false);
        assert_eq!(payload["error_type"], "Panic");
        assert_eq!(payload["error"], "boom");
        assert_eq!(payload["tool"], "shell");
        assert_eq!(payload["traceback"], "boom");

        // The state is intact afterwards: the next dispatch still runs
        let ok = dispatch_guarded(&server, "shell", "deadbeef", async {
            Ok(CallToolResult::success(vec![Content::text("fine")]))
        })
        .await
        .unwrap();
        assert_eq!(
            ok.content.first().and_then(|c| c.as_text()).unwrap().text,
            "fine"
        );
    }

    #[tokio::test]
    async fn test_dispatch_guarded_passes_errors_through() {
        let server = test_server();
        let err = dispatch_guarded(&server, "shell", "deadbeef", async {
            Err(ErrorData::invalid_params("bad args", None))
        })
        .await
        .unwrap_err();
        assert!(err.message.contains("bad args"));
    }

    #[test]
    fn test_panic_message_variants() {
        assert_eq!(panic_message(Box::new("static str")), "static str");
        assert_eq!(
            panic_message(Box::new("owned".to_string())),
            "owned"
        );
        assert_eq!(panic_message(Box::new(42_u32)), "unknown panic");
    }
}
