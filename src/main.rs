//! Entry point for MCP Relay.
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use mcp_relay::{
    cli::{execute_command, RelayArgs},
    config::RelayConfig,
    lib::telemetry,
};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:?}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    telemetry::init_tracing()?;
    let args = RelayArgs::parse();
    let config = RelayConfig::load(args.config_override)?;
    let output = execute_command(args.command, config).await?;
    println!("{output}");
    Ok(())
}
