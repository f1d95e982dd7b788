// src/exec/hdc.rs
// Invoker for the hdc device-control CLI

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, error, warn};

use crate::error::Result;

use super::output::{quote_command_line, truncate_chars, truncate_output};
use super::result::InvocationResult;
use super::{resolve::resolve_executable, spawn_and_capture};

/// Locations probed when HDC_PATH points at an SDK directory.
const HDC_CANDIDATES: &[&str] = &["hdc", "hdc.exe", "bin/hdc", "bin/hdc.exe"];

/// Default deadline for a single hdc command.
pub const DEFAULT_HDC_TIMEOUT: Duration = Duration::from_secs(120);

/// Default cap on captured output lines per stream.
pub const DEFAULT_HDC_MAX_OUTPUT_LINES: usize = 500;

/// One hdc invocation: arguments after the executable, plus execution knobs.
#[derive(Debug, Clone)]
pub struct HdcRequest {
    pub args: Vec<String>,
    /// Routed to a specific device via `-t <id>` when set
    pub device: Option<String>,
    /// `None` means no deadline
    pub timeout: Option<Duration>,
    /// Extra environment entries; override the inherited environment
    pub env: HashMap<String, String>,
    pub max_output_lines: usize,
}

impl HdcRequest {
    pub fn new(args: Vec<String>) -> Self {
        Self {
            args,
            device: None,
            timeout: Some(DEFAULT_HDC_TIMEOUT),
            env: HashMap::new(),
            max_output_lines: DEFAULT_HDC_MAX_OUTPUT_LINES,
        }
    }
}

/// Runs hdc commands against a once-resolved executable.
#[derive(Debug, Clone)]
pub struct HdcInvoker {
    executable: PathBuf,
}

impl HdcInvoker {
    /// Resolve the executable once. `configured` comes from explicit config
    /// or HDC_PATH; `None` falls back to `hdc` on PATH.
    pub fn new(configured: Option<&str>) -> Self {
        let configured = configured
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("hdc");
        let executable = resolve_executable(configured, HDC_CANDIDATES);
        Self { executable }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Run one hdc command. Timeouts and non-zero exits come back as data
    /// in the result; only spawn-level problems are errors.
    pub async fn run(&self, request: HdcRequest) -> Result<InvocationResult> {
        let mut command = Vec::with_capacity(request.args.len() + 3);
        command.push(self.executable.to_string_lossy().into_owned());
        if let Some(device) = &request.device {
            command.push("-t".to_string());
            command.push(device.clone());
        }
        command.extend(request.args.iter().cloned());

        let command_line = quote_command_line(&command);
        debug!(
            timeout_secs = request.timeout.map(|t| t.as_secs_f64()),
            "running hdc command: {}", command_line
        );

        let start = Instant::now();
        let captured =
            spawn_and_capture(&command, None, &request.env, request.timeout).await?;
        let duration_ms = start.elapsed().as_millis() as u64;

        let stdout = truncate_output(&captured.stdout, request.max_output_lines);
        let stderr_raw = if captured.timed_out && captured.stderr.trim().is_empty() {
            "timeout waiting for hdc".to_string()
        } else {
            captured.stderr
        };
        let stderr = truncate_output(&stderr_raw, request.max_output_lines);

        if captured.timed_out {
            error!(
                elapsed_ms = duration_ms,
                "hdc command timed out: {}", command_line
            );
            return Ok(InvocationResult::timed_out(command, None, stdout, stderr));
        }

        debug!(
            returncode = captured.returncode,
            elapsed_ms = duration_ms,
            stdout_len = stdout.len(),
            stderr_len = stderr.len(),
            "hdc command finished"
        );
        if captured.returncode != 0 {
            warn!(
                returncode = captured.returncode,
                "hdc command failed: {}", command_line
            );
            let trimmed = stderr.trim();
            if !trimmed.is_empty() {
                warn!("hdc stderr: {}", truncate_chars(trimmed, 500));
            }
        }

        Ok(InvocationResult::completed(
            command,
            None,
            stdout,
            stderr,
            captured.returncode,
        ))
    }
}
