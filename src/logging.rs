// src/logging.rs
// Tracing setup: stderr plus a daily-rolling file under the log directory

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::EnvConfig;

const LOG_FILE_PREFIX: &str = "harmony-tools.log";

/// Keeps the non-blocking writer alive for the life of the process.
pub struct LogHandle {
    pub guard: WorkerGuard,
    /// Directory the rolling log files land in
    pub log_dir: PathBuf,
}

impl LogHandle {
    /// Path reported to clients in failure payloads. The appender adds a
    /// date suffix, so point at the directory's stable prefix.
    pub fn log_file(&self) -> PathBuf {
        self.log_dir.join(LOG_FILE_PREFIX)
    }
}

/// Resolve the log directory: explicit override, then XDG_CACHE_HOME,
/// then ~/.cache, then the working directory as a last resort.
pub fn default_log_dir(override_dir: Option<&Path>) -> PathBuf {
    if let Some(dir) = override_dir {
        return dir.to_path_buf();
    }
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        if !xdg.trim().is_empty() {
            return PathBuf::from(xdg).join("harmony-tools");
        }
    }
    match dirs::home_dir() {
        Some(home) => home.join(".cache").join("harmony-tools"),
        None => PathBuf::from("."),
    }
}

/// Initialize tracing with a stderr layer and a daily-rolling file layer.
/// Stdout stays untouched: the MCP stdio transport owns it.
pub fn init(config: &EnvConfig) -> Result<LogHandle> {
    let log_dir = default_log_dir(config.log_dir.as_deref());
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let directive = config.log_level.as_deref().unwrap_or("info");
    let filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_ansi(false))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    // Panics land in the log file too, not just stderr
    std::panic::set_hook(Box::new(|info| {
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "unknown location".to_string());
        tracing::error!(location = %location, "panic: {}", payload);
    }));

    Ok(LogHandle { guard, log_dir })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_wins() {
        let dir = default_log_dir(Some(Path::new("/var/log/harmony")));
        assert_eq!(dir, PathBuf::from("/var/log/harmony"));
    }

    #[test]
    fn test_fallback_is_under_cache() {
        // XDG_CACHE_HOME may or may not be set in the test environment;
        // either way the directory ends in the service name
        let dir = default_log_dir(None);
        assert!(dir.ends_with("harmony-tools") || dir == PathBuf::from("."));
    }

    #[test]
    fn test_log_file_name() {
        let handle_dir = PathBuf::from("/tmp/harmony-logs");
        let file = handle_dir.join(LOG_FILE_PREFIX);
        assert_eq!(file.file_name().unwrap(), "harmony-tools.log");
    }
}
