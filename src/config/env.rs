// src/config/env.rs
// Environment-based configuration - single source of truth for all env vars

use std::path::PathBuf;

use tracing::debug;

/// Environment configuration - tool paths and logging. HOST/PORT are read
/// by the CLI layer via clap's env fallbacks.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    /// Path to the hdc executable or its SDK directory (HDC_PATH)
    pub hdc_path: Option<String>,
    /// Path to the hvigorw wrapper or its directory (HVIGORW_PATH)
    pub hvigorw_path: Option<String>,
    /// Log directory override (HARMONY_TOOLS_LOG_DIR)
    pub log_dir: Option<PathBuf>,
    /// Log level/filter override (HARMONY_TOOLS_LOG_LEVEL)
    pub log_level: Option<String>,
}

impl EnvConfig {
    /// Load all environment configuration (call once at startup)
    pub fn load() -> Self {
        let config = Self {
            hdc_path: read_var("HDC_PATH"),
            hvigorw_path: read_var("HVIGORW_PATH"),
            log_dir: read_var("HARMONY_TOOLS_LOG_DIR").map(PathBuf::from),
            log_level: read_var("HARMONY_TOOLS_LOG_LEVEL"),
        };
        debug!(?config, "environment configuration loaded");
        config
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConfigValidation {
        let mut validation = ConfigValidation::new();

        if self.hdc_path.is_none() {
            validation.add_warning(
                "HDC_PATH not set. Falling back to `hdc` on PATH; device tools will fail if it is not installed.",
            );
        } else if let Some(path) = &self.hdc_path {
            let expanded = crate::exec::resolve::expand_path(path);
            if !PathBuf::from(&expanded).exists() {
                validation.add_warning(format!("HDC_PATH '{}' does not exist", path));
            }
        }

        if let Some(path) = &self.hvigorw_path {
            let expanded = crate::exec::resolve::expand_path(path);
            if !PathBuf::from(&expanded).exists() {
                validation.add_warning(format!("HVIGORW_PATH '{}' does not exist", path));
            }
        }

        validation
    }
}

/// Read a single env var, filtering empty values
fn read_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Configuration validation result
#[derive(Debug, Default)]
pub struct ConfigValidation {
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl ConfigValidation {
    pub fn new() -> Self {
        Self {
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    pub fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    /// Format as a human-readable report
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        if !self.errors.is_empty() {
            lines.push("Errors:".to_string());
            for err in &self.errors {
                lines.push(format!("  - {}", err));
            }
        }

        if !self.warnings.is_empty() {
            lines.push("Warnings:".to_string());
            for warn in &self.warnings {
                lines.push(format!("  - {}", warn));
            }
        }

        if lines.is_empty() {
            "Configuration OK".to_string()
        } else {
            lines.join("\n")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_warns_without_hdc_path() {
        let config = EnvConfig::default();
        let validation = config.validate();
        assert!(validation.is_valid()); // Warnings don't make it invalid
        assert!(validation.warnings.iter().any(|w| w.contains("HDC_PATH")));
    }

    #[test]
    fn test_validation_warns_on_missing_paths() {
        let config = EnvConfig {
            hdc_path: Some("/no/such/sdk/hdc".to_string()),
            hvigorw_path: Some("/no/such/hvigorw".to_string()),
            ..Default::default()
        };
        let validation = config.validate();
        assert_eq!(validation.warnings.len(), 2);
    }

    #[test]
    fn test_validation_report() {
        let mut validation = ConfigValidation::new();
        assert_eq!(validation.report(), "Configuration OK");

        validation.add_warning("something minor");
        validation.add_error("something fatal");
        let report = validation.report();
        assert!(report.contains("Errors:"));
        assert!(report.contains("something fatal"));
        assert!(report.contains("Warnings:"));
        assert!(report.contains("something minor"));
        assert!(!validation.is_valid());
    }
}
