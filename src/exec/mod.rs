// src/exec/mod.rs
// Process invocation layer: executable resolution, spawning, output shaping

pub mod hdc;
pub mod hvigor;
pub mod output;
pub mod resolve;
pub mod result;

pub use hdc::{HdcInvoker, HdcRequest};
pub use hvigor::{HvigorInvoker, HvigorRequest};
pub use result::InvocationResult;

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::Command;

use crate::error::{Result, ToolsError};

/// Raw capture from a finished (or killed) child process.
pub(crate) struct Captured {
    pub stdout: String,
    pub stderr: String,
    pub returncode: i32,
    pub timed_out: bool,
}

/// Spawn a command with piped stdio and wait for it, enforcing an optional
/// deadline. On timeout the child is killed and whatever output it produced
/// so far is still returned.
pub(crate) async fn spawn_and_capture(
    command: &[String],
    cwd: Option<&Path>,
    env: &HashMap<String, String>,
    timeout: Option<Duration>,
) -> Result<Captured> {
    let Some((program, args)) = command.split_first() else {
        return Err(ToolsError::InvalidArguments(
            "command cannot be empty".to_string(),
        ));
    };

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    // Overrides win over the inherited environment
    cmd.envs(env);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ToolsError::Environment(program.clone()));
        }
        Err(e) => return Err(e.into()),
    };

    // Drain both pipes concurrently so a chatty child can't block on a full pipe
    let stdout_task = child.stdout.take().map(|mut pipe| {
        tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf).await;
            buf
        })
    });
    let stderr_task = child.stderr.take().map(|mut pipe| {
        tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf).await;
            buf
        })
    });

    let status = match timeout {
        Some(deadline) => match tokio::time::timeout(deadline, child.wait()).await {
            Ok(status) => Some(status?),
            Err(_) => {
                // Kill closes the pipes, so the reader tasks see EOF and
                // hand back the partial output
                let _ = child.kill().await;
                let _ = child.wait().await;
                None
            }
        },
        None => Some(child.wait().await?),
    };

    let stdout = match stdout_task {
        Some(task) => task.await.unwrap_or_default(),
        None => Vec::new(),
    };
    let stderr = match stderr_task {
        Some(task) => task.await.unwrap_or_default(),
        None => Vec::new(),
    };

    Ok(match status {
        Some(status) => Captured {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            returncode: exit_code(&status),
            timed_out: false,
        },
        None => Captured {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            returncode: -1,
            timed_out: true,
        },
    })
}

/// Exit code of a finished child. A signal-killed child reports the negated
/// signal number so the timeout path stays the only producer of the plain
/// `-1` + `timed_out` pairing.
#[cfg(unix)]
fn exit_code(status: &std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    match status.code() {
        Some(code) => code,
        None => status.signal().map(|sig| -sig).unwrap_or(-1),
    }
}

#[cfg(not(unix))]
fn exit_code(status: &std::process::ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}
