// src/exec/result.rs
// Normalized outcome of a tool process invocation

use std::path::PathBuf;

use serde_json::{Value, json};

use super::output::{quote_command_line, strip_ansi_codes};

/// Outcome of one hdc/hvigorw invocation. Timeouts and non-zero exits are
/// plain data here, not errors: the tagged constructors keep the pairing of
/// `timed_out` and the `-1` return code consistent.
#[derive(Debug, Clone)]
pub struct InvocationResult {
    command: Vec<String>,
    cwd: Option<PathBuf>,
    stdout: String,
    stderr: String,
    returncode: i32,
    timed_out: bool,
}

impl InvocationResult {
    /// Process ran to completion (with any exit code).
    pub fn completed(
        command: Vec<String>,
        cwd: Option<PathBuf>,
        stdout: String,
        stderr: String,
        returncode: i32,
    ) -> Self {
        Self {
            command,
            cwd,
            stdout,
            stderr,
            returncode,
            timed_out: false,
        }
    }

    /// Process was killed at the deadline; partial output is kept.
    pub fn timed_out(
        command: Vec<String>,
        cwd: Option<PathBuf>,
        stdout: String,
        stderr: String,
    ) -> Self {
        Self {
            command,
            cwd,
            stdout,
            stderr,
            returncode: -1,
            timed_out: true,
        }
    }

    pub fn returncode(&self) -> i32 {
        self.returncode
    }

    pub fn is_timed_out(&self) -> bool {
        self.timed_out
    }

    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    /// Copy-pasteable shell rendering of the argv.
    pub fn command_line(&self) -> String {
        quote_command_line(&self.command)
    }

    /// Transport payload: trimmed, ANSI-stripped output plus the exact
    /// command that ran. `cwd` appears only for invocations that had one.
    pub fn to_payload(&self) -> Value {
        let mut payload = json!({
            "command": self.command,
            "command_line": self.command_line(),
            "stdout": strip_ansi_codes(self.stdout.trim()),
            "stderr": strip_ansi_codes(self.stderr.trim()),
            "returncode": self.returncode,
            "timed_out": self.timed_out,
        });
        if let Some(cwd) = &self.cwd {
            payload["cwd"] = json!(cwd.to_string_lossy());
        }
        payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completed_payload() {
        let result = InvocationResult::completed(
            vec!["hdc".into(), "list".into(), "targets".into()],
            None,
            "device-1\n".into(),
            "".into(),
            0,
        );
        let payload = result.to_payload();
        assert_eq!(payload["command_line"], "hdc list targets");
        assert_eq!(payload["stdout"], "device-1");
        assert_eq!(payload["returncode"], 0);
        assert_eq!(payload["timed_out"], false);
        assert!(payload.get("cwd").is_none());
    }

    #[test]
    fn test_timed_out_forces_sentinel_code() {
        let result = InvocationResult::timed_out(
            vec!["hdc".into(), "shell".into(), "sleep 600".into()],
            None,
            "partial".into(),
            "timeout waiting for hdc".into(),
        );
        assert!(result.is_timed_out());
        assert_eq!(result.returncode(), -1);

        let payload = result.to_payload();
        assert_eq!(payload["returncode"], -1);
        assert_eq!(payload["timed_out"], true);
        assert_eq!(payload["stdout"], "partial");
    }

    #[test]
    fn test_payload_includes_cwd_when_present() {
        let result = InvocationResult::completed(
            vec!["./hvigorw".into(), "clean".into()],
            Some(PathBuf::from("/work/app")),
            "".into(),
            "".into(),
            0,
        );
        assert_eq!(result.to_payload()["cwd"], "/work/app");
    }

    #[test]
    fn test_payload_strips_ansi_and_trims() {
        let result = InvocationResult::completed(
            vec!["hdc".into()],
            None,
            "  \x1b[32mOK\x1b[0m  \n".into(),
            "\x1b[31mwarn\x1b[0m\n".into(),
            0,
        );
        let payload = result.to_payload();
        assert_eq!(payload["stdout"], "OK");
        assert_eq!(payload["stderr"], "warn");
    }

    #[test]
    fn test_command_line_quotes_spaces() {
        let result = InvocationResult::completed(
            vec!["hdc".into(), "shell".into(), "ls -l /data".into()],
            None,
            "".into(),
            "".into(),
            0,
        );
        assert_eq!(result.command_line(), "hdc shell 'ls -l /data'");
    }

    #[test]
    fn test_command_line_round_trips_through_shell_split() {
        let argv = vec!["shell".to_string(), "ls -la".to_string(), "a b".to_string()];
        let result =
            InvocationResult::completed(argv.clone(), None, "".into(), "".into(), 0);
        let reparsed = shell_words::split(&result.command_line()).unwrap();
        assert_eq!(reparsed, argv);
    }
}
