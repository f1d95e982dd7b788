// src/exec/hvigor.rs
// Invoker for the hvigorw build wrapper

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, error, warn};

use crate::error::{Result, ToolsError};

use super::output::{quote_command_line, truncate_chars, truncate_output};
use super::resolve::{expand_path, resolve_executable};
use super::result::InvocationResult;
use super::spawn_and_capture;

/// Locations probed when HVIGORW_PATH points at a directory.
const HVIGORW_CANDIDATES: &[&str] = &["hvigorw", "bin/hvigorw"];

/// Default deadline for a build invocation. Builds are slow; 15 minutes.
pub const DEFAULT_HVIGOR_TIMEOUT: Duration = Duration::from_secs(900);

/// Default cap on captured output lines per stream. Build logs are noisy,
/// only the tail matters for diagnosing failures.
pub const DEFAULT_HVIGOR_MAX_OUTPUT_LINES: usize = 100;

/// One hvigorw invocation, always rooted in a project directory.
#[derive(Debug, Clone)]
pub struct HvigorRequest {
    pub args: Vec<String>,
    /// Project root the wrapper runs in; required and must exist
    pub project_dir: String,
    /// `None` means no deadline
    pub timeout: Option<Duration>,
    /// Extra environment entries; override the inherited environment
    pub env: HashMap<String, String>,
    pub max_output_lines: usize,
}

impl HvigorRequest {
    pub fn new(args: Vec<String>, project_dir: impl Into<String>) -> Self {
        Self {
            args,
            project_dir: project_dir.into(),
            timeout: Some(DEFAULT_HVIGOR_TIMEOUT),
            env: HashMap::new(),
            max_output_lines: DEFAULT_HVIGOR_MAX_OUTPUT_LINES,
        }
    }
}

/// Runs hvigorw commands against a once-resolved executable.
#[derive(Debug, Clone)]
pub struct HvigorInvoker {
    executable: PathBuf,
}

impl HvigorInvoker {
    /// Resolve the executable once. `configured` comes from explicit config
    /// or HVIGORW_PATH; `None` falls back to the project-local `./hvigorw`
    /// wrapper script, resolved against the project directory at spawn time.
    pub fn new(configured: Option<&str>) -> Self {
        let configured = configured
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("./hvigorw");
        let executable = resolve_executable(configured, HVIGORW_CANDIDATES);
        Self { executable }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Run one hvigorw command inside `project_dir`. A missing or invalid
    /// project directory is a configuration error; build failures and
    /// timeouts are data in the result.
    pub async fn run(&self, request: HvigorRequest) -> Result<InvocationResult> {
        if request.project_dir.trim().is_empty() {
            return Err(ToolsError::Config(
                "project_dir is required for hvigor commands".to_string(),
            ));
        }
        let project_dir = PathBuf::from(expand_path(&request.project_dir));
        if !project_dir.is_dir() {
            return Err(ToolsError::Config(format!(
                "project_dir '{}' does not exist or is not a directory",
                request.project_dir
            )));
        }

        let mut command = Vec::with_capacity(request.args.len() + 1);
        command.push(self.executable.to_string_lossy().into_owned());
        command.extend(request.args.iter().cloned());

        let command_line = quote_command_line(&command);
        debug!(
            cwd = %project_dir.display(),
            timeout_secs = request.timeout.map(|t| t.as_secs_f64()),
            "running hvigorw command: {}", command_line
        );

        let start = Instant::now();
        let captured = spawn_and_capture(
            &command,
            Some(&project_dir),
            &request.env,
            request.timeout,
        )
        .await?;
        let duration_ms = start.elapsed().as_millis() as u64;

        let stdout = truncate_output(&captured.stdout, request.max_output_lines);
        let stderr_raw = if captured.timed_out && captured.stderr.trim().is_empty() {
            "timeout waiting for hvigorw".to_string()
        } else {
            captured.stderr
        };
        let stderr = truncate_output(&stderr_raw, request.max_output_lines);

        if captured.timed_out {
            error!(
                elapsed_ms = duration_ms,
                cwd = %project_dir.display(),
                "hvigorw command timed out: {}", command_line
            );
            return Ok(InvocationResult::timed_out(
                command,
                Some(project_dir),
                stdout,
                stderr,
            ));
        }

        debug!(
            returncode = captured.returncode,
            elapsed_ms = duration_ms,
            stdout_len = stdout.len(),
            stderr_len = stderr.len(),
            "hvigorw command finished"
        );
        if captured.returncode != 0 {
            warn!(
                returncode = captured.returncode,
                "hvigorw command failed: {}", command_line
            );
            let trimmed = stderr.trim();
            if !trimmed.is_empty() {
                warn!("hvigorw stderr: {}", truncate_chars(trimmed, 500));
            }
        }

        Ok(InvocationResult::completed(
            command,
            Some(project_dir),
            stdout,
            stderr,
            captured.returncode,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_request_knobs() {
        let request = HvigorRequest::new(vec!["clean".into()], "/work/app");
        assert_eq!(request.timeout, Some(DEFAULT_HVIGOR_TIMEOUT));
        assert_eq!(request.max_output_lines, DEFAULT_HVIGOR_MAX_OUTPUT_LINES);
    }

    #[test]
    fn test_default_executable_is_project_local() {
        let invoker = HvigorInvoker::new(None);
        assert_eq!(invoker.executable(), Path::new("./hvigorw"));
    }

    #[tokio::test]
    async fn test_empty_project_dir_is_config_error() {
        let invoker = HvigorInvoker::new(Some("/bin/sh"));
        let request = HvigorRequest::new(vec!["clean".into()], "  ");
        let err = invoker.run(request).await.unwrap_err();
        assert!(matches!(err, ToolsError::Config(_)));
    }

    #[tokio::test]
    async fn test_missing_project_dir_is_config_error() {
        let invoker = HvigorInvoker::new(Some("/bin/sh"));
        let request = HvigorRequest::new(vec!["clean".into()], "/no/such/project");
        let err = invoker.run(request).await.unwrap_err();
        assert!(matches!(err, ToolsError::Config(_)));
        assert!(err.to_string().contains("/no/such/project"));
    }
}
