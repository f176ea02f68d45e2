//! CLI argument definitions.
use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Command-line arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    author,
    version,
    about = "MCP Relay: proxy MCP server tools into an agent host",
    long_about = None
)]
pub struct RelayArgs {
    /// Path to a relay TOML file (overrides MCP_RELAY_CONFIG).
    #[arg(long = "config", global = true)]
    pub config_override: Option<PathBuf>,
    #[command(subcommand)]
    pub command: RelayCommand,
}

/// Top-level commands.
#[derive(Debug, Clone, Subcommand)]
pub enum RelayCommand {
    /// List the tools the plugin registers with the host.
    Tools,
    /// Execute one host tool, connecting to its server on first use.
    Call {
        /// Tool name as listed by `tools`.
        tool: String,
        /// JSON object with the tool arguments.
        #[arg(long, default_value = "{}")]
        args: String,
    },
    /// Connect to every configured server and list the tools it exposes.
    Discover,
    /// Print the effective configuration as TOML.
    Config,
}
