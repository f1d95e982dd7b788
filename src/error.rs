// src/error.rs
// Standardized error types for harmony-tools

use thiserror::Error;

/// Main error type for the harmony-tools library
#[derive(Error, Debug)]
pub enum ToolsError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("executable not found: {0}")]
    Environment(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown error: {0}")]
    Other(String),
}

/// Convenience type alias for Result using ToolsError
pub type Result<T> = std::result::Result<T, ToolsError>;

impl ToolsError {
    /// Stable failure-kind tag surfaced in tool failure payloads
    pub fn kind(&self) -> &'static str {
        match self {
            ToolsError::InvalidArguments(_) => "InvalidArguments",
            ToolsError::Config(_) => "Config",
            ToolsError::Environment(_) => "Environment",
            ToolsError::Io(_) => "Io",
            ToolsError::Json(_) => "Json",
            ToolsError::Other(_) => "Other",
        }
    }
}

impl From<String> for ToolsError {
    fn from(s: String) -> Self {
        ToolsError::Other(s)
    }
}

impl From<ToolsError> for String {
    fn from(err: ToolsError) -> Self {
        err.to_string()
    }
}
