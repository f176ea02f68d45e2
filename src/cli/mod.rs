//! CLI command execution on top of the plugin and an in-process host.
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use serde_json::{json, Value};
use tracing::warn;

use crate::{
    client::{ConnectionRegistry, Connector, RmcpConnector},
    config::{RelayConfig, ServerLaunchConfig},
    plugin::{McpClientPlugin, ToolHost, GATEWAY_STOP},
    tools::synthesize_tool_name,
};

pub mod args;

pub use args::{RelayArgs, RelayCommand};

/// Execute `command` with the real child-process connector.
pub async fn execute_command(command: RelayCommand, config: RelayConfig) -> Result<String> {
    execute_with_connector(command, config, Arc::new(RmcpConnector)).await
}

/// Execute `command` and return the text to print on stdout.
pub async fn execute_with_connector(
    command: RelayCommand,
    config: RelayConfig,
    connector: Arc<dyn Connector>,
) -> Result<String> {
    let registry = Arc::new(ConnectionRegistry::new(connector, config.client.clone()));

    match command {
        RelayCommand::Tools => {
            let extra = config.servers.iter().collect::<Vec<_>>();
            let host = build_host(&registry, &config, &extra).await;
            let listing = host
                .tools()
                .iter()
                .map(|tool| format!("{}\t{}", tool.name(), tool.description()))
                .collect::<Vec<_>>()
                .join("\n");
            host.emit(GATEWAY_STOP).await;
            Ok(listing)
        }
        RelayCommand::Call { tool, args } => {
            let params: Value = serde_json::from_str(&args)
                .with_context(|| format!("--args is not valid JSON: {args}"))?;
            if !(params.is_object() || params.is_null()) {
                return Err(anyhow!("--args must be a JSON object"));
            }

            let targets = config
                .servers
                .iter()
                .filter(|server| tool.starts_with(&synthesize_tool_name(&server.name, "")))
                .collect::<Vec<_>>();
            let host = build_host(&registry, &config, &targets).await;
            if host.tool(&tool).is_none() {
                host.emit(GATEWAY_STOP).await;
                return Err(anyhow!("unknown tool `{tool}`; run `mcp-relay tools`"));
            }
            let output = host.execute(&tool, params).await;
            host.emit(GATEWAY_STOP).await;
            Ok(output)
        }
        RelayCommand::Discover => discover(&registry, &config).await,
        RelayCommand::Config => config.to_toml().context("failed to render configuration"),
    }
}

/// Host with the Athena proxies plus adapters for the tools of `extra`.
///
/// `extra` servers are connected up front so their tools can be listed; a
/// server that fails to connect contributes no tools.
async fn build_host(
    registry: &Arc<ConnectionRegistry>,
    config: &RelayConfig,
    extra: &[&ServerLaunchConfig],
) -> ToolHost {
    for server in extra {
        if let Err(err) = registry.connect(server).await {
            warn!(
                target: "mcp_relay::plugin",
                server = %server.name,
                error = %err,
                "Skipping server, its tools will not be exposed"
            );
        }
    }

    let discovered = registry
        .list_all_capabilities()
        .await
        .into_iter()
        .filter(|(server, _)| *server != config.athena.name)
        .collect();

    let mut host = ToolHost::new();
    McpClientPlugin::new(Arc::clone(registry), config.athena.clone())
        .with_discovered_tools(discovered)
        .register(&mut host);
    host
}

/// Connect to every configured server, report its tools, then tear everything down.
async fn discover(registry: &Arc<ConnectionRegistry>, config: &RelayConfig) -> Result<String> {
    let mut servers = Vec::new();
    for server in config.all_servers() {
        match registry.connect(server).await {
            Ok(()) => servers.push(json!({ "server": server.name, "status": "connected" })),
            Err(err) => {
                warn!(
                    target: "mcp_relay::plugin",
                    server = %server.name,
                    error = %err,
                    "Skipping server during discovery"
                );
                servers.push(json!({
                    "server": server.name,
                    "status": "failed",
                    "error": err.to_string(),
                }));
            }
        }
    }

    let tools = registry
        .list_all_capabilities()
        .await
        .into_iter()
        .map(|(server, tool)| {
            json!({
                "name": synthesize_tool_name(&server, &tool.name),
                "server": server,
                "tool": tool.name,
                "description": tool.description,
            })
        })
        .collect::<Vec<_>>();

    registry
        .disconnect_all()
        .await
        .context("failed to disconnect after discovery")?;

    let payload = json!({
        "servers": servers,
        "tools": tools,
    });
    Ok(serde_json::to_string_pretty(&payload)?)
}
