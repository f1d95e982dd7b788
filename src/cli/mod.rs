// src/cli/mod.rs
// Command-line interface

pub mod serve;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "harmony-tools")]
#[command(about = "MCP service exposing HarmonyOS hdc and hvigorw tooling")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the MCP server (default)
    Serve {
        /// Transport to serve on
        #[arg(long, value_enum, default_value_t = Transport::Stdio)]
        transport: Transport,

        /// Bind host for the http transport
        #[arg(long, env = "HOST", default_value = "127.0.0.1")]
        host: String,

        /// Bind port for the http transport
        #[arg(long, env = "PORT", default_value_t = 10005)]
        port: u16,
    },

    /// Print resolved executables and configuration warnings, then exit
    Check,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Transport {
    /// Speak MCP over stdin/stdout (for editor/agent integration)
    Stdio,
    /// Streamable HTTP endpoint at /mcp
    Http,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parses() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_serve_defaults() {
        let cli = Cli::try_parse_from(["harmony-tools", "serve"]).unwrap();
        match cli.command {
            Some(Commands::Serve {
                transport,
                host,
                port,
            }) => {
                assert_eq!(transport, Transport::Stdio);
                assert_eq!(host, "127.0.0.1");
                assert_eq!(port, 10005);
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_http_transport_flag() {
        let cli = Cli::try_parse_from([
            "harmony-tools",
            "serve",
            "--transport",
            "http",
            "--port",
            "8080",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Serve {
                transport, port, ..
            }) => {
                assert_eq!(transport, Transport::Http);
                assert_eq!(port, 8080);
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_no_subcommand_is_allowed() {
        let cli = Cli::try_parse_from(["harmony-tools"]).unwrap();
        assert!(cli.command.is_none());
    }
}
