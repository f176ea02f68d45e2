//! The MCP client plugin: registers the Athena proxy tools, adapters for
//! discovered tools, and the shutdown hook.
use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    client::{ConnectionRegistry, ToolDescriptor},
    config::ServerLaunchConfig,
    tools::{adapt, athena_tools, AgentTool},
};

pub mod host;

pub use host::{
    HookFuture, LifecycleHook, PluginApi, ToolFactory, ToolHost, GATEWAY_STOP,
};

pub const PLUGIN_ID: &str = "mcp-client";
pub const PLUGIN_NAME: &str = "MCP Client";
pub const PLUGIN_DESCRIPTION: &str = "Connect to MCP servers (Athena, etc.) and use their tools";

/// Plugin state owned by the host's initialization context.
pub struct McpClientPlugin {
    registry: Arc<ConnectionRegistry>,
    athena: Arc<ServerLaunchConfig>,
    discovered: Vec<(String, ToolDescriptor)>,
}

impl McpClientPlugin {
    pub fn new(registry: Arc<ConnectionRegistry>, athena: ServerLaunchConfig) -> Self {
        Self {
            registry,
            athena: Arc::new(athena),
            discovered: Vec::new(),
        }
    }

    /// Also expose tools already discovered on connected servers.
    pub fn with_discovered_tools(mut self, tools: Vec<(String, ToolDescriptor)>) -> Self {
        self.discovered = tools;
        self
    }

    /// Every tool this plugin contributes, Athena proxies first.
    pub fn tools(&self) -> Vec<Arc<dyn AgentTool>> {
        let mut tools = athena_tools(&self.registry, &self.athena);
        tools.extend(self.discovered.iter().map(|(server, descriptor)| {
            Arc::new(adapt(Arc::clone(&self.registry), server, descriptor)) as Arc<dyn AgentTool>
        }));
        tools
    }

    pub fn register(&self, api: &mut dyn PluginApi) {
        let tools = self.tools();
        let names = tools
            .iter()
            .map(|tool| tool.name().to_string())
            .collect::<Vec<_>>();

        for tool in tools {
            api.register_tool(Box::new(move || Arc::clone(&tool)));
        }

        let registry = Arc::clone(&self.registry);
        api.on(
            GATEWAY_STOP,
            Box::new(move || -> HookFuture {
                let registry = Arc::clone(&registry);
                Box::pin(async move {
                    info!(target: "mcp_relay::plugin", "Disconnecting from MCP servers");
                    if let Err(err) = registry.disconnect_all().await {
                        warn!(
                            target: "mcp_relay::plugin",
                            error = %err,
                            "MCP teardown finished with failures"
                        );
                    }
                })
            }),
        );

        info!(
            target: "mcp_relay::plugin",
            plugin = PLUGIN_ID,
            name = PLUGIN_NAME,
            description = PLUGIN_DESCRIPTION,
            tool_count = names.len(),
            tools = %names.join(", "),
            "MCP Client plugin registered"
        );
    }
}
