// src/lib.rs
// harmony-tools - MCP service exposing HarmonyOS hdc and hvigorw tooling

pub mod artifacts;
pub mod cli;
pub mod config;
pub mod error;
pub mod exec;
pub mod logging;
pub mod mcp;

pub use error::{Result, ToolsError};
